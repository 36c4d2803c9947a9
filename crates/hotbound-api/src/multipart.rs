use crate::transport::FormPart;
use hotbound_core::ApiError;

/// How many boundary tokens are tried before giving up on a body.
pub const MAX_BOUNDARY_ATTEMPTS: usize = 16;

/// An encoded `multipart/form-data` body and the boundary that delimits it.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    /// Encode `parts` with a fresh random (UUID v4) boundary.
    pub fn encode(parts: &[FormPart]) -> Result<Self, ApiError> {
        Self::encode_with(parts, random_boundary)
    }

    /// Encode `parts`, drawing boundary candidates from `next_boundary` until
    /// one does not occur anywhere in the part data or headers.
    pub fn encode_with(
        parts: &[FormPart],
        mut next_boundary: impl FnMut() -> String,
    ) -> Result<Self, ApiError> {
        for part in parts {
            check_header_fields(part)?;
        }
        for attempt in 1..=MAX_BOUNDARY_ATTEMPTS {
            let boundary = next_boundary();
            if collides(&boundary, parts) {
                tracing::warn!(attempt, "multipart boundary collides with part content, re-rolling");
                continue;
            }
            let bytes = write_body(&boundary, parts);
            return Ok(Self { boundary, bytes });
        }
        Err(ApiError::Encoding(format!(
            "no collision-free multipart boundary after {MAX_BOUNDARY_ATTEMPTS} attempts"
        )))
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

// Part names and filenames are written unescaped inside quoted header values.
fn check_header_fields(part: &FormPart) -> Result<(), ApiError> {
    let quoted = [("name", &part.name), ("filename", &part.filename)];
    for (field, value) in quoted {
        if value.contains(['"', '\r', '\n']) {
            return Err(ApiError::Encoding(format!(
                "multipart {field} {value:?} contains a quote or line break"
            )));
        }
    }
    if part.content_type.contains(['\r', '\n']) {
        return Err(ApiError::Encoding(format!(
            "multipart content type {:?} contains a line break",
            part.content_type
        )));
    }
    Ok(())
}

fn random_boundary() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn collides(boundary: &str, parts: &[FormPart]) -> bool {
    let needle = boundary.as_bytes();
    if needle.is_empty() {
        return true;
    }
    parts.iter().any(|part| {
        contains(&part.data, needle)
            || part.name.contains(boundary)
            || part.filename.contains(boundary)
            || part.content_type.contains(boundary)
    })
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn write_body(boundary: &str, parts: &[FormPart]) -> Vec<u8> {
    let payload: usize = parts.iter().map(|p| p.data.len() + 128).sum();
    let mut body = Vec::with_capacity(payload + boundary.len() + 8);

    for part in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, part.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes());
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
