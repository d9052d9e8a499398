use std::path::Path;

use chrono::{DateTime, Utc};
use opencv::{
    core::{min_max_loc, Mat, Point, Range, Vector},
    imgcodecs::imwrite,
    imgproc::{cvt_color, match_template, threshold, COLOR_BGR2GRAY, THRESH_BINARY, TM_CCOEFF_NORMED},
    prelude::*,
};

use crate::roi::{new_region, Region};

/// One captured screen, BGR.
#[derive(Clone)]
pub struct Frame {
    pub mat: Mat,
    pub num: i64,
    pub captured_at: DateTime<Utc>,
}

unsafe impl Send for Frame {}
unsafe impl Sync for Frame {}

impl Frame {
    pub fn new(mat: Mat, num: i64) -> Frame {
        Frame {
            mat,
            num,
            captured_at: Utc::now(),
        }
    }

    /// An empty frame, for callers that never look at pixels.
    pub fn blank(num: i64) -> Frame {
        Frame::new(Mat::default(), num)
    }

    pub fn bounds(&self) -> Region {
        new_region(0, 0, self.mat.cols(), self.mat.rows())
    }

    pub fn extract_roi(&self, region: Region) -> opencv::Result<Mat> {
        let cropped = self
            .mat
            .col_range(&Range::new(region.x, region.x + region.width)?)?;

        cropped.row_range(&Range::new(region.y, region.y + region.height)?)
    }

    /// Best match of `template` inside `area` (screen coordinates). A match
    /// scoring below `min_score` counts as not found.
    pub fn locate(
        &self,
        template: &Mat,
        area: Region,
        min_score: f64,
    ) -> opencv::Result<Option<Region>> {
        let area = area.intersect(&self.bounds());
        if area.width < template.cols() || area.height < template.rows() {
            return Ok(None);
        }

        let haystack = self.extract_roi(area)?;
        let mut scores = Mat::default();
        match_template(
            &haystack,
            template,
            &mut scores,
            TM_CCOEFF_NORMED,
            &Mat::default(),
        )?;

        let mut best = 0.0;
        let mut best_at = Point::default();
        min_max_loc(
            &scores,
            None,
            Some(&mut best),
            None,
            Some(&mut best_at),
            &Mat::default(),
        )?;

        if best < min_score {
            return Ok(None);
        }

        trace!("frame {}\tmatch score {:.3} at {:?}", self.num, best, best_at);

        Ok(Some(new_region(
            area.x + best_at.x,
            area.y + best_at.y,
            template.cols(),
            template.rows(),
        )))
    }

    /// Gray, thresholded crop of `area`, the input the digit recognizer
    /// expects. `None` when `area` lies off the frame.
    pub fn binarize(&self, area: Region, level: f64) -> opencv::Result<Option<Mat>> {
        let area = area.intersect(&self.bounds());
        if area.is_empty() {
            return Ok(None);
        }

        let cropped = self.extract_roi(area)?;

        let mut gray = Mat::default();
        cvt_color(&cropped, &mut gray, COLOR_BGR2GRAY, 0)?;

        let mut binary = Mat::default();
        threshold(&gray, &mut binary, level, 255.0, THRESH_BINARY)?;

        Ok(Some(binary))
    }

    pub fn dump(&self, path: &Path) -> opencv::Result<bool> {
        imwrite(&path.to_string_lossy(), &self.mat, &Vector::<i32>::new())
    }
}
