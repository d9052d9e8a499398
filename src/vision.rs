use opencv::{dnn, prelude::*};

use crate::{
    img::{self, frame::Frame, Templates},
    landmark::Landmark,
    roi::Region,
};

/// Pixel evidence. Both lookups are best effort: any failure reads as absent.
pub trait Vision {
    /// Where `landmark` shows inside `area` (screen coordinates), if it does.
    fn locate(&mut self, frame: &Frame, landmark: Landmark, area: Region) -> Option<Region>;

    /// The number printed inside `area` (screen coordinates), if it can be read.
    fn read_number(&mut self, frame: &Frame, area: Region) -> Option<i64>;
}

pub struct TemplateVision {
    templates: Templates,
    min_score: f64,
    recognizer: Option<dnn::TextRecognitionModel>,
    ocr_threshold: f64,
}

pub fn new(
    templates: Templates,
    min_score: f64,
    recognizer: Option<dnn::TextRecognitionModel>,
    ocr_threshold: f64,
) -> TemplateVision {
    TemplateVision {
        templates,
        min_score,
        recognizer,
        ocr_threshold,
    }
}

impl Vision for TemplateVision {
    fn locate(&mut self, frame: &Frame, landmark: Landmark, area: Region) -> Option<Region> {
        let template = match self.templates.get(&landmark) {
            Some(template) => template,
            None => {
                warn!("no template loaded for {}", landmark);
                return None;
            }
        };

        match frame.locate(template, area, self.min_score) {
            Ok(found) => found,
            Err(error) => {
                warn!("frame {}\tmatching {} failed: {}", frame.num, landmark, error);
                None
            }
        }
    }

    fn read_number(&mut self, frame: &Frame, area: Region) -> Option<i64> {
        let recognizer = self.recognizer.as_mut()?;

        let binary = match frame.binarize(area, self.ocr_threshold) {
            Ok(Some(mat)) => mat,
            Ok(None) => {
                trace!("frame {}\tcounter area {:?} is off the frame", frame.num, area);
                return None;
            }
            Err(error) => {
                warn!("frame {}\tpreparing ocr input failed: {}", frame.num, error);
                return None;
            }
        };

        match recognizer.recognize(&binary) {
            Ok(text) => {
                trace!("frame {}\tocr text {:?}", frame.num, text);
                img::parse_number(&text)
            }
            Err(error) => {
                warn!("frame {}\tocr failed: {}", frame.num, error);
                None
            }
        }
    }
}
