use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{AnalysisResult, Category, DetectedObject, Landmark};

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").unwrap());

/// Render an analysis as display lines, in fixed section order.
pub fn format_analysis(result: &AnalysisResult) -> Vec<String> {
    let mut lines = Vec::new();

    for caption in result.captions() {
        lines.push(format!(
            "Description: {} (confidence: {})",
            caption.text,
            percent(caption.confidence)
        ));
    }

    lines.push("Categories:".to_string());
    for category in &result.categories {
        lines.push(bullet(&category.name, category.score));
    }

    let landmarks = unique_landmarks(&result.categories);
    if !landmarks.is_empty() {
        lines.push("Landmarks:".to_string());
        for landmark in landmarks {
            lines.push(bullet(&landmark.name, landmark.confidence));
        }
    }

    if !result.tags.is_empty() {
        lines.push("Tags:".to_string());
        for tag in &result.tags {
            lines.push(bullet(&tag.name, tag.confidence));
        }
    }

    if !result.brands.is_empty() {
        lines.push("Brands:".to_string());
        for brand in &result.brands {
            lines.push(bullet(&brand.name, brand.confidence));
        }
    }

    let adult = &result.adult;
    if adult.is_adult_content {
        lines.push("Adult content detected.".to_string());
    }
    if adult.is_racy_content {
        lines.push("Provocative content detected.".to_string());
    }
    lines.push("Ratings:".to_string());
    lines.push(format!(" -Adult: {}", flag(adult.is_adult_content)));
    lines.push(format!(" -Racy: {}", flag(adult.is_racy_content)));
    lines.push(format!(" -Gore: {}", flag(adult.is_gory_content)));

    if let Some(color) = &result.color {
        if let Some(accent) = &color.accent_color {
            lines.push(format!("Accent color: {}", accent_color(accent)));
        }
        if let Some(dominant) = color.dominant_colors.as_ref().filter(|c| !c.is_empty()) {
            lines.push("Dominant colors:".to_string());
            for name in dominant {
                lines.push(format!(" -{}", name));
            }
        }
    }

    if !result.objects.is_empty() {
        lines.push("Objects in image:".to_string());
        for object in &result.objects {
            lines.push(object_line(object));
        }
    }

    lines
}

/// Collect landmarks across all categories, keeping the first entry per name.
pub fn unique_landmarks(categories: &[Category]) -> Vec<&Landmark> {
    let mut unique: Vec<&Landmark> = Vec::new();
    let nested = categories
        .iter()
        .filter_map(|c| c.detail.as_ref())
        .filter_map(|d| d.landmarks.as_ref())
        .flatten();
    for landmark in nested {
        if !unique.iter().any(|seen| seen.name == landmark.name) {
            unique.push(landmark);
        }
    }
    unique
}

/// `0.942` → `"94.20%"`.
pub fn percent(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

fn bullet(name: &str, confidence: f64) -> String {
    format!(" -{} (confidence: {})", name, percent(confidence))
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn accent_color(raw: &str) -> String {
    if HEX_COLOR_RE.is_match(raw) {
        format!("#{}", raw.to_uppercase())
    } else {
        raw.to_string()
    }
}

fn object_line(object: &DetectedObject) -> String {
    let r = object.rectangle;
    format!(
        "{} with confidence {} at location ({}, {})-({}, {})",
        object.label,
        percent(object.confidence),
        r.x,
        r.y,
        r.right(),
        r.bottom()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdultInfo, BoundingRect, Brand, CategoryDetail, ColorInfo, Tag};

    fn category(name: &str, landmarks: &[(&str, f64)]) -> Category {
        Category {
            name: name.to_string(),
            score: 0.5,
            detail: Some(CategoryDetail {
                landmarks: Some(
                    landmarks
                        .iter()
                        .map(|(n, c)| Landmark {
                            name: n.to_string(),
                            confidence: *c,
                        })
                        .collect(),
                ),
            }),
        }
    }

    fn tag(name: &str, confidence: f64) -> Tag {
        Tag {
            name: name.to_string(),
            confidence,
            hint: None,
        }
    }

    #[test]
    fn percent_uses_two_decimals() {
        assert_eq!(percent(0.942), "94.20%");
        assert_eq!(percent(1.0), "100.00%");
        assert_eq!(percent(0.0), "0.00%");
    }

    #[test]
    fn landmarks_are_deduplicated_by_name() {
        let categories = vec![
            category("building_", &[("Eiffel Tower", 0.99)]),
            category("outdoor_", &[("Eiffel Tower", 0.71), ("Arc de Triomphe", 0.6)]),
        ];
        let lines = format_analysis(&AnalysisResult {
            categories,
            ..AnalysisResult::default()
        });

        let eiffel = lines.iter().filter(|l| l.contains("Eiffel Tower")).count();
        assert_eq!(eiffel, 1);
        assert!(lines.contains(&" -Eiffel Tower (confidence: 99.00%)".to_string()));
        assert!(lines.contains(&" -Arc de Triomphe (confidence: 60.00%)".to_string()));
    }

    #[test]
    fn no_landmarks_means_no_header() {
        let lines = format_analysis(&AnalysisResult {
            categories: vec![Category {
                name: "animal_cat".to_string(),
                score: 0.9,
                detail: None,
            }],
            ..AnalysisResult::default()
        });
        assert!(!lines.iter().any(|l| l == "Landmarks:"));
        assert_eq!(lines[0], "Categories:");
        assert_eq!(lines[1], " -animal_cat (confidence: 90.00%)");
    }

    #[test]
    fn clean_image_prints_only_ratings_block() {
        let lines = format_analysis(&AnalysisResult::default());
        let text = lines.join("\n");
        assert!(text.contains("Ratings:\n -Adult: False\n -Racy: False\n -Gore: False"));
        assert!(!text.contains("content detected"));
    }

    #[test]
    fn flagged_content_prints_warnings_before_ratings() {
        let lines = format_analysis(&AnalysisResult {
            adult: AdultInfo {
                is_adult_content: true,
                is_racy_content: true,
                ..AdultInfo::default()
            },
            ..AnalysisResult::default()
        });
        let warning = lines.iter().position(|l| l == "Adult content detected.").unwrap();
        let racy = lines.iter().position(|l| l == "Provocative content detected.").unwrap();
        let ratings = lines.iter().position(|l| l == "Ratings:").unwrap();
        assert!(warning < racy && racy < ratings);
        assert_eq!(lines[ratings + 1], " -Adult: True");
    }

    #[test]
    fn tags_listed_in_order_and_empty_brands_omitted() {
        let lines = format_analysis(&AnalysisResult {
            tags: vec![tag("cat", 0.98), tag("dog", 0.5)],
            ..AnalysisResult::default()
        });
        let start = lines.iter().position(|l| l == "Tags:").unwrap();
        assert_eq!(lines[start + 1], " -cat (confidence: 98.00%)");
        assert_eq!(lines[start + 2], " -dog (confidence: 50.00%)");
        assert!(!lines.iter().any(|l| l == "Brands:"));
    }

    #[test]
    fn brands_listed_when_present() {
        let lines = format_analysis(&AnalysisResult {
            brands: vec![Brand {
                name: "Microsoft".to_string(),
                confidence: 0.81,
                rectangle: None,
            }],
            ..AnalysisResult::default()
        });
        let start = lines.iter().position(|l| l == "Brands:").unwrap();
        assert_eq!(lines[start + 1], " -Microsoft (confidence: 81.00%)");
    }

    #[test]
    fn colors_follow_ratings() {
        let lines = format_analysis(&AnalysisResult {
            color: Some(ColorInfo {
                accent_color: Some("c8a32e".to_string()),
                dominant_colors: Some(vec!["Brown".to_string(), "White".to_string()]),
                ..ColorInfo::default()
            }),
            ..AnalysisResult::default()
        });
        let tail: Vec<&str> = lines.iter().map(String::as_str).skip_while(|l| *l != " -Gore: False").collect();
        assert_eq!(
            tail,
            vec![
                " -Gore: False",
                "Accent color: #C8A32E",
                "Dominant colors:",
                " -Brown",
                " -White"
            ]
        );
    }

    #[test]
    fn non_hex_accent_is_printed_verbatim() {
        assert_eq!(accent_color("teal"), "teal");
    }

    #[test]
    fn objects_show_corner_coordinates() {
        let lines = format_analysis(&AnalysisResult {
            objects: vec![DetectedObject {
                label: "bicycle".to_string(),
                confidence: 0.873,
                rectangle: BoundingRect {
                    x: 12,
                    y: 30,
                    w: 100,
                    h: 50,
                },
            }],
            ..AnalysisResult::default()
        });
        let n = lines.len();
        assert_eq!(lines[n - 2], "Objects in image:");
        assert_eq!(
            lines[n - 1],
            "bicycle with confidence 87.30% at location (12, 30)-(112, 80)"
        );
    }

    #[test]
    fn captions_come_first() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{"description":{"tags":[],"captions":[{"text":"a cat on a sofa","confidence":0.942}]}}"#,
        )
        .unwrap();
        let lines = format_analysis(&result);
        assert_eq!(lines[0], "Description: a cat on a sofa (confidence: 94.20%)");
    }
}
