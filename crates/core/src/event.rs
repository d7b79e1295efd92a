use serde::{Deserialize, Serialize};

/// An `(x, y)` corner coordinate.
pub type Point = [f64; 2];

/// Axis-aligned box described by two corners.
///
/// `top_left` is expected to be the lesser corner on both axes, but this is
/// not enforced; [`BoundingBox::contains`] only compares components.
/// Rule regions in the config use `topLeft`/`bottomRight`, detection payloads
/// use `top_left`/`bottom_right`; both spellings deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(alias = "topLeft")]
    pub top_left: Point,
    #[serde(alias = "bottomRight")]
    pub bottom_right: Point,
}

impl BoundingBox {
    pub fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// True when `inner` lies entirely within `self` (edges may touch).
    pub fn contains(&self, inner: &BoundingBox) -> bool {
        inner.top_left[0] >= self.top_left[0]
            && inner.top_left[1] >= self.top_left[1]
            && inner.bottom_right[0] <= self.bottom_right[0]
            && inner.bottom_right[1] <= self.bottom_right[1]
    }

    /// True when either axis has its corners swapped.
    pub fn is_inverted(&self) -> bool {
        self.top_left[0] > self.bottom_right[0] || self.top_left[1] > self.bottom_right[1]
    }
}

/// One observation received from a detector feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Source topic the observation arrived on.
    pub identifier: String,
    pub label: String,
    /// Confidence as supplied upstream; the range is not constrained.
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

impl DetectionEvent {
    pub fn new(
        identifier: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
        bounding_box: BoundingBox,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
            confidence,
            bounding_box,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_strictly_inside() {
        let region = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        assert!(region.contains(&BoundingBox::new([1.0, 1.0], [9.0, 9.0])));
    }

    #[test]
    fn contains_allows_touching_edges() {
        let region = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        assert!(region.contains(&BoundingBox::new([0.0, 0.0], [10.0, 10.0])));
    }

    #[test]
    fn contains_rejects_overhang_on_any_side() {
        let region = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        assert!(!region.contains(&BoundingBox::new([-1.0, 1.0], [9.0, 9.0])));
        assert!(!region.contains(&BoundingBox::new([1.0, -0.5], [9.0, 9.0])));
        assert!(!region.contains(&BoundingBox::new([1.0, 1.0], [10.5, 9.0])));
        assert!(!region.contains(&BoundingBox::new([1.0, 1.0], [9.0, 11.0])));
    }

    #[test]
    fn contains_is_not_an_overlap_test() {
        let small = BoundingBox::new([4.0, 4.0], [6.0, 6.0]);
        let large = BoundingBox::new([0.0, 0.0], [10.0, 10.0]);
        assert!(!small.contains(&large));
    }

    #[test]
    fn inverted_box_detected() {
        assert!(BoundingBox::new([5.0, 0.0], [1.0, 10.0]).is_inverted());
        assert!(!BoundingBox::new([0.0, 0.0], [1.0, 1.0]).is_inverted());
    }

    #[test]
    fn deserializes_both_spellings() {
        let snake: BoundingBox =
            serde_json::from_str(r#"{"top_left":[1,2],"bottom_right":[3,4]}"#).unwrap();
        let camel: BoundingBox =
            serde_json::from_str(r#"{"topLeft":[1,2],"bottomRight":[3,4]}"#).unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.top_left, [1.0, 2.0]);
    }
}
