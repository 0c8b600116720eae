// ABOUTME: Image generation request and response types for /v1/images/generations
// ABOUTME: Enumerates the size, quality, style, and output format options the API accepts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    /// 256x256
    #[serde(rename = "256x256")]
    Size256,
    /// 512x512
    #[serde(rename = "512x512")]
    Size512,
    /// 1024x1024
    #[serde(rename = "1024x1024")]
    Size1024,
    /// 1024x1536 portrait
    #[serde(rename = "1024x1536")]
    Size1024x1536,
    /// 1792x1024 landscape
    #[serde(rename = "1792x1024")]
    Size1792x1024,
    /// 1024x1792 portrait
    #[serde(rename = "1024x1792")]
    Size1024x1792,
}

/// Background handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackground {
    /// Transparent background
    Transparent,
    /// Opaque background
    Opaque,
    /// Let the model decide
    Auto,
}

/// Content moderation level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageModeration {
    /// Less restrictive filtering
    Low,
    /// Default filtering
    Auto,
}

/// Rendering quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    /// Let the model decide
    Auto,
    /// High quality
    High,
    /// Medium quality
    Medium,
    /// Low quality
    Low,
    /// HD (dall-e-3)
    Hd,
    /// Standard (dall-e-3)
    Standard,
}

/// How generated images are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    /// Temporary URL
    Url,
    /// Base64-encoded bytes inline
    B64Json,
}

/// Visual style (dall-e-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    /// Hyper-real, dramatic
    Vivid,
    /// Natural looking
    Natural,
}

/// Image generation request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    /// Image model (`dall-e-3`, `gpt-image-1`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Text description of the desired image
    pub prompt: String,
    /// Number of images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    /// Output dimensions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
    /// Background handling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<ImageBackground>,
    /// Moderation level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation: Option<ImageModeration>,
    /// Compression level 0-100 for lossy output formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_compression: Option<u8>,
    /// Rendering quality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<ImageQuality>,
    /// Return format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ImageFormat>,
    /// Visual style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<ImageStyle>,
    /// End-user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl GenerateImageRequest {
    /// Request a single image for `prompt` with provider defaults
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Set the image model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the output dimensions
    #[must_use]
    pub const fn with_size(mut self, size: ImageSize) -> Self {
        self.size = Some(size);
        self
    }
}

/// A generated image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Temporary URL, when `response_format` is `url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Base64 bytes, when `response_format` is `b64_json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    /// Prompt after provider-side rewriting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Response of `POST /v1/images/generations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResponse {
    /// Creation time, unix seconds
    #[serde(default)]
    pub created: i64,
    /// Generated images
    #[serde(default)]
    pub data: Vec<Image>,
    /// Token usage (gpt-image models only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}
