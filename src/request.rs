// Request bodies for the two render endpoints. The CLI hands over a flat
// bag of knobs; this module turns them into the nested JSON the service
// expects, attaching PDF and video option groups only for the formats they
// apply to.

use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Value sent as `source` on every render request.
pub const REQUEST_SOURCE: &str = "cli";

/// Template customizations, field name to value.
pub type Modifications = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpg,
    Jpeg,
    Webp,
    Pdf,
    Mp4,
    Webm,
    Gif,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Webp => "webp",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Webm => "webm",
            OutputFormat::Gif => "gif",
        }
    }

    pub fn is_pdf(self) -> bool {
        self == OutputFormat::Pdf
    }

    /// Video and animation formats, the ones that take `videoOptions`.
    pub fn is_video(self) -> bool {
        matches!(self, OutputFormat::Mp4 | OutputFormat::Webm | OutputFormat::Gif)
    }

    /// Library renders only produce still images and PDFs.
    pub fn supported_by_library(self) -> bool {
        !self.is_video()
    }

    /// Lossy still-image formats, the ones that take `response.quality`.
    pub fn takes_image_quality(self) -> bool {
        matches!(self, OutputFormat::Jpg | OutputFormat::Jpeg | OutputFormat::Webp)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the service should hand back the rendered asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Base64,
    Binary,
    Url,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseType::Base64 => "base64",
            ResponseType::Binary => "binary",
            ResponseType::Url => "url",
        })
    }
}

/// The `response` sub-object shared by both request variants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseOptions {
    pub format: OutputFormat,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_pages: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfOptions {
    pub dpi: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOptions {
    #[serde(rename = "loop")]
    pub looped: bool,
    pub muted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

/// Options for a library render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub response_type: ResponseType,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            format: OutputFormat::Png,
            response_type: ResponseType::Base64,
        }
    }
}

/// Flat set of studio render knobs, as collected from the command line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StudioOptions {
    pub render: RenderOptions,
    pub scale: Option<u32>,
    pub pages: Option<Vec<u32>>,
    pub dpi: Option<u32>,
    pub quality: Option<u8>,
    pub looped: bool,
    pub muted: bool,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
    pub webhook: Option<String>,
}

/// Body for `POST /v1/generate/images`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryRenderRequest {
    pub template_id: String,
    pub modifications: Modifications,
    pub source: &'static str,
    pub response: ResponseOptions,
}

impl LibraryRenderRequest {
    /// Library renders only carry format and type; still-image quality is
    /// not part of this body.
    pub fn new(template_id: &str, modifications: Modifications, options: &RenderOptions) -> Self {
        LibraryRenderRequest {
            template_id: template_id.to_string(),
            modifications,
            source: REQUEST_SOURCE,
            response: ResponseOptions {
                format: options.format,
                response_type: options.response_type,
                scale: None,
                include_pages: None,
                quality: None,
            },
        }
    }
}

/// Body for `POST /v1/studio/render`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioRenderRequest {
    pub template_id: String,
    pub modifications: Modifications,
    pub source: &'static str,
    pub response: ResponseOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_options: Option<PdfOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_options: Option<VideoOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
}

impl StudioRenderRequest {
    pub fn new(template_id: &str, modifications: Modifications, options: &StudioOptions) -> Self {
        let format = options.render.format;

        let response = ResponseOptions {
            format,
            response_type: options.render.response_type,
            scale: options.scale,
            include_pages: options.pages.clone(),
            quality: options.quality.filter(|_| format.takes_image_quality()),
        };

        let pdf_options = match options.dpi {
            Some(dpi) if format.is_pdf() => Some(PdfOptions { dpi }),
            _ => None,
        };

        // Always attached for video formats, flags or not.
        let video_options = format.is_video().then(|| VideoOptions {
            looped: options.looped,
            muted: options.muted,
            trim_start: options.trim_start,
            trim_end: options.trim_end,
            quality: options.quality,
        });

        StudioRenderRequest {
            template_id: template_id.to_string(),
            modifications,
            source: REQUEST_SOURCE,
            response,
            pdf_options,
            video_options,
            webhook: options.webhook.clone(),
        }
    }
}

/// Parse `key=value` arguments. Only the first `=` separates key from
/// value; entries without one, or with an empty key, are skipped.
pub fn parse_modifications<S: AsRef<str>>(args: &[S]) -> Modifications {
    let mut mods = Modifications::new();
    for arg in args {
        let arg = arg.as_ref();
        match arg.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                mods.insert(key.to_string(), value.to_string());
            }
            _ => log::warn!("ignoring malformed modification '{}' (expected key=value)", arg),
        }
    }
    mods
}

/// Fold interactive answers into `mods`. Blank answers leave the existing
/// value untouched; everything else is trimmed and overrides it.
pub fn merge_answers<I>(mods: &mut Modifications, answers: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, answer) in answers {
        let answer = answer.trim();
        if !answer.is_empty() {
            mods.insert(key, answer.to_string());
        }
    }
}
