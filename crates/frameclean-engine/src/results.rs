//! The ordered gallery of enhanced images.

use std::time::Duration;

use frameclean_capture::EncodedImage;
use frameclean_ipc::{format_timestamp, ArtifactView};

/// One enhanced image, with its source position for video captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    timestamp: Option<Duration>,
    image: EncodedImage,
}

impl CaptureArtifact {
    /// An artifact captured from video at `timestamp`.
    pub fn video(timestamp: Duration, image: EncodedImage) -> Self {
        Self {
            timestamp: Some(timestamp),
            image,
        }
    }

    /// An artifact from single-image enhancement.
    pub fn still(image: EncodedImage) -> Self {
        Self {
            timestamp: None,
            image,
        }
    }

    pub fn timestamp(&self) -> Option<Duration> {
        self.timestamp
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// Suggested download name for the entry at `index`.
    pub fn file_name(&self, index: usize) -> String {
        format!("processed-image-{}.{}", index + 1, self.image.extension())
    }

    /// Presentation view of the entry at `index`.
    pub fn to_view(&self, index: usize) -> ArtifactView {
        ArtifactView {
            index,
            timestamp_secs: self.timestamp.map(|t| t.as_secs_f64()),
            timestamp_label: self.timestamp.map(format_timestamp),
            data_url: self.image.to_data_url(),
            file_name: self.file_name(index),
        }
    }
}

/// Gallery ordering: still images first, most recent first, then video
/// captures ascending by timestamp.
#[derive(Debug, Default)]
pub struct ResultCollection {
    entries: Vec<CaptureArtifact>,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact at its ordered position and return that position.
    ///
    /// Video captures are placed by timestamp (captures at equal timestamps
    /// keep capture order); stills are prepended.
    pub fn insert(&mut self, artifact: CaptureArtifact) -> usize {
        let index = match artifact.timestamp {
            None => 0,
            Some(ts) => self.entries.partition_point(|e| match e.timestamp {
                None => true,
                Some(existing) => existing <= ts,
            }),
        };
        self.entries.insert(index, artifact);
        index
    }

    pub fn get(&self, index: usize) -> Option<&CaptureArtifact> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaptureArtifact> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Presentation views of all entries, in order.
    pub fn views(&self) -> Vec<ArtifactView> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, artifact)| artifact.to_view(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: u8) -> EncodedImage {
        EncodedImage::jpeg(vec![tag])
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    fn timestamps(results: &ResultCollection) -> Vec<Option<f64>> {
        results
            .iter()
            .map(|a| a.timestamp().map(|t| t.as_secs_f64()))
            .collect()
    }

    #[test]
    fn test_backward_seek_is_sorted() {
        let mut results = ResultCollection::new();
        assert_eq!(results.insert(CaptureArtifact::video(secs(12.5), frame(1))), 0);
        assert_eq!(results.insert(CaptureArtifact::video(secs(3.0), frame(2))), 0);

        assert_eq!(timestamps(&results), vec![Some(3.0), Some(12.5)]);
    }

    #[test]
    fn test_increasing_captures_stay_sorted() {
        let mut results = ResultCollection::new();
        for (i, s) in [1.0, 2.5, 7.0, 30.0, 61.25].into_iter().enumerate() {
            assert_eq!(results.insert(CaptureArtifact::video(secs(s), frame(i as u8))), i);
        }
        assert_eq!(
            timestamps(&results),
            vec![Some(1.0), Some(2.5), Some(7.0), Some(30.0), Some(61.25)]
        );
    }

    #[test]
    fn test_interleaved_order() {
        let mut results = ResultCollection::new();
        for s in [40.0, 10.0, 25.0, 5.0, 25.0] {
            results.insert(CaptureArtifact::video(secs(s), frame(0)));
        }
        let got = timestamps(&results);
        let mut sorted = got.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(got, sorted);
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_equal_timestamps_keep_capture_order() {
        let mut results = ResultCollection::new();
        results.insert(CaptureArtifact::video(secs(4.0), frame(1)));
        let index = results.insert(CaptureArtifact::video(secs(4.0), frame(2)));
        assert_eq!(index, 1);
        assert_eq!(results.get(1).unwrap().image(), &frame(2));
    }

    #[test]
    fn test_stills_are_prepended() {
        let mut results = ResultCollection::new();
        results.insert(CaptureArtifact::still(frame(1)));
        assert_eq!(results.insert(CaptureArtifact::still(frame(2))), 0);

        assert_eq!(results.get(0).unwrap().image(), &frame(2));
        assert_eq!(results.get(1).unwrap().image(), &frame(1));
    }

    #[test]
    fn test_views() {
        let mut results = ResultCollection::new();
        results.insert(CaptureArtifact::video(secs(75.0), frame(1)));
        let views = results.views();

        assert_eq!(views[0].timestamp_label.as_deref(), Some("1:15"));
        assert_eq!(views[0].file_name, "processed-image-1.jpg");
        assert!(views[0].data_url.starts_with("data:image/jpeg;base64,"));
    }
}
