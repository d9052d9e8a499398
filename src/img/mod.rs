use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use opencv::core::{Mat, Scalar, Size};
use opencv::dnn;
use opencv::imgcodecs::{imread, IMREAD_COLOR};
use opencv::prelude::*;
use opencv::types::VectorOfString;

use crate::landmark::Landmark;

pub mod frame;

pub type Templates = HashMap<Landmark, Mat>;

/// Reads one PNG per landmark from `dir`.
pub fn load_templates(dir: &Path, landmarks: &[Landmark]) -> Result<Templates> {
    let mut templates = HashMap::new();

    for landmark in landmarks {
        let path = dir.join(landmark.file_name());
        let mat = imread(&path.to_string_lossy(), IMREAD_COLOR)
            .with_context(|| format!("reading template {}", path.display()))?;

        if mat.rows() == 0 || mat.cols() == 0 {
            bail!("template {} is missing or empty", path.display());
        }

        debug!(
            "loaded template {}\t{}x{}",
            landmark,
            mat.cols(),
            mat.rows()
        );
        templates.insert(*landmark, mat);
    }

    Ok(templates)
}

pub fn make_text_recognizer(
    model_path: &Path,
    vocabulary_path: &Path,
    use_cuda: bool,
) -> Result<dnn::TextRecognitionModel> {
    debug!("loading models for text recognition");

    let mut recognizer = dnn::TextRecognitionModel::from_file(&model_path.to_string_lossy(), "")
        .with_context(|| format!("loading recognizer {}", model_path.display()))?;

    if use_cuda {
        recognizer
            .set_preferable_target(dnn::Target::DNN_TARGET_CUDA)?
            .set_preferable_backend(dnn::Backend::DNN_BACKEND_CUDA)?;
    }

    // Load vocabulary
    let mut vocabulary = VectorOfString::new();
    let voc_file = BufReader::new(
        File::open(vocabulary_path)
            .with_context(|| format!("opening vocabulary {}", vocabulary_path.display()))?,
    );
    for voc_line in voc_file.lines() {
        vocabulary.push(&voc_line?);
    }

    // Parameters for Recognition
    let rec_scale = 1. / 127.5;
    let rec_mean = Scalar::from((127.5, 127.5, 127.5));
    let rec_input_size = Size::new(100, 32);
    recognizer
        .set_vocabulary(&vocabulary)?
        .set_decode_type("CTC-greedy")?
        .set_input_params(rec_scale, rec_input_size, rec_mean, false, false)?;

    Ok(recognizer)
}

/// Digits of a recognized string as a number; anything without digits is no reading.
pub fn parse_number(text: &str) -> Option<i64> {
    let digits = text
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect::<String>();

    if digits.is_empty() {
        return None;
    }

    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_keeps_digits_only() {
        assert_eq!(parse_number("12"), Some(12));
        assert_eq!(parse_number(" 0 4\n"), Some(4));
        assert_eq!(parse_number("x7"), Some(7));
    }

    #[test]
    fn parse_number_without_digits_is_no_reading() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("lvl"), None);
        assert_eq!(parse_number("99999999999999999999999"), None);
    }
}
