use std::fmt;

use crate::matcher::SimilarityScore;

/// Messages published on the status surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    CameraStarting,
    Ready,
    Similarity(SimilarityScore),
    Recognized(SimilarityScore),
    CameraUnavailable(String),
    Reset,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::CameraStarting => write!(f, "status: camera starting"),
            Status::Ready => write!(f, "status: ready"),
            Status::Similarity(best) => write!(f, "similarity: {:.2}", best.value()),
            Status::Recognized(best) => write!(f, "recognized (similarity: {:.2})", best.value()),
            Status::CameraUnavailable(reason) => write!(f, "camera unavailable: {}", reason),
            Status::Reset => write!(f, "status: reset"),
        }
    }
}

pub trait StatusSink {
    fn publish(&mut self, status: Status);
}

impl<F: FnMut(Status)> StatusSink for F {
    fn publish(&mut self, status: Status) {
        self(status)
    }
}

/// Publishes status lines through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn publish(&mut self, status: Status) {
        log::info!("{}", status);
    }
}
