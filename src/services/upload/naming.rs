use uuid::Uuid;

/// Extension of `name` if it has a usable one (`"photo.JPG"` -> `"JPG"`).
pub fn extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// Fresh object key for a submitted file, keeping its extension.
pub fn derive_stored_reference(prefix: &str, name: &str) -> String {
    match extension(name) {
        Some(ext) => format!("{}{}.{}", prefix, Uuid::new_v4(), ext),
        None => format!("{}{}", prefix, Uuid::new_v4()),
    }
}

/// Default image title: the file name with its last extension removed.
pub fn derive_title(name: &str) -> String {
    match name.rfind('.') {
        Some(i) if i > 0 => name[..i].to_string(),
        _ => name.to_string(),
    }
}

/// Content type served for a stored object, guessed from its extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = extension(key).unwrap_or_default().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}
