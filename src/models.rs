use serde::{Deserialize, Serialize};

/// Request body shared by the analyze and thumbnail endpoints.
#[derive(Debug, Serialize)]
pub struct ImageUrlRequest<'a> {
    pub url: &'a str,
}

/// Result of one `analyze` call. Every feature block is optional on the
/// wire, so missing blocks deserialize to their empty value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisResult {
    pub categories: Vec<Category>,
    pub adult: AdultInfo,
    pub color: Option<ColorInfo>,
    pub tags: Vec<Tag>,
    pub description: Option<Description>,
    pub objects: Vec<DetectedObject>,
    pub brands: Vec<Brand>,
    pub request_id: Option<String>,
    pub metadata: Option<ImageMetadata>,
    pub model_version: Option<String>,
}

impl AnalysisResult {
    pub fn captions(&self) -> &[Caption] {
        self.description
            .as_ref()
            .map(|d| d.captions.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Description {
    pub tags: Vec<String>,
    pub captions: Vec<Caption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Caption {
    pub text: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub detail: Option<CategoryDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryDetail {
    pub landmarks: Option<Vec<Landmark>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Landmark {
    pub name: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tag {
    pub name: String,
    pub confidence: f64,
    #[serde(default)]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Brand {
    pub name: String,
    pub confidence: f64,
    #[serde(default)]
    pub rectangle: Option<BoundingRect>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdultInfo {
    pub is_adult_content: bool,
    pub is_racy_content: bool,
    pub is_gory_content: bool,
    pub adult_score: f64,
    pub racy_score: f64,
    pub gore_score: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorInfo {
    pub dominant_color_foreground: Option<String>,
    pub dominant_color_background: Option<String>,
    pub dominant_colors: Option<Vec<String>>,
    pub accent_color: Option<String>,
    #[serde(rename = "isBWImg")]
    pub is_bw_img: bool,
}

/// One detected object. Coordinates are source-image pixels, origin top-left.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectedObject {
    #[serde(rename = "object")]
    pub label: String,
    pub confidence: f64,
    pub rectangle: BoundingRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingRect {
    /// Edges saturate at the `i32` bounds.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.h)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub format: Option<String>,
}

/// Error envelope returned by the service on non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_feature_blocks_default_to_empty() {
        let result: AnalysisResult = serde_json::from_str(r#"{"requestId":"abc"}"#).unwrap();
        assert!(result.categories.is_empty());
        assert!(result.objects.is_empty());
        assert!(result.captions().is_empty());
        assert!(!result.adult.is_adult_content);
        assert_eq!(result.request_id.as_deref(), Some("abc"));
    }

    #[test]
    fn object_label_comes_from_object_field() {
        let obj: DetectedObject = serde_json::from_str(
            r#"{"rectangle":{"x":10,"y":20,"w":30,"h":40},"object":"dog","confidence":0.81}"#,
        )
        .unwrap();
        assert_eq!(obj.label, "dog");
        assert_eq!(obj.rectangle.right(), 40);
        assert_eq!(obj.rectangle.bottom(), 60);
    }

    #[test]
    fn far_edges_saturate() {
        let rect: BoundingRect = serde_json::from_str(
            r#"{"x":2147483000,"y":-2147483000,"w":2147483647,"h":-2147483647}"#,
        )
        .unwrap();
        assert_eq!(rect.right(), i32::MAX);
        assert_eq!(rect.bottom(), i32::MIN);
    }

    #[test]
    fn color_block_reads_bw_flag_and_accent() {
        let color: ColorInfo = serde_json::from_str(
            r#"{"accentColor":"C8A32E","dominantColors":["Brown"],"isBWImg":true}"#,
        )
        .unwrap();
        assert!(color.is_bw_img);
        assert_eq!(color.accent_color.as_deref(), Some("C8A32E"));
        assert_eq!(color.dominant_colors.unwrap(), vec!["Brown".to_string()]);
    }
}
