use std::path::Path;

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "tiff" | "tif" => "image/tiff",
        "webp" => "image/webp",
        _ => FALLBACK_MIME_TYPE,
    }
}

/// Extension used for naming the spooled file. Unknown types get `bin`.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/bmp" => "bmp",
        "image/gif" => "gif",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/tiff" => "tiff",
        "image/webp" => "webp",
        _ => "bin",
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map(mime_for_extension)
        .unwrap_or(FALLBACK_MIME_TYPE)
}
