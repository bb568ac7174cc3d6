//! Static file responses.

use std::io;
use std::path::Path;

use tracing::error;

use lantern_http::protocol::{ContentType, Response, Status};

/// Reads a file into a response, detecting the content type from the
/// extension. A missing file answers `404`, any other read failure `500`.
pub fn file_response(path: impl AsRef<Path>) -> Response {
    let path = path.as_ref();
    match std::fs::read(path) {
        Ok(content) => {
            let content_type = ContentType::from_path(&path.to_string_lossy());
            Response::new(Status::Ok, content_type, content)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Response::error_page(Status::NotFound, "File not found")
        }
        Err(e) => {
            error!(path = %path.display(), cause = %e, "failed to read file");
            Response::error_page(Status::InternalServerError, "Cannot read file")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_existing_file_with_detected_type() {
        let dir = std::env::temp_dir().join("lantern-files-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("hello.html");
        std::fs::write(&path, "<h1>hi</h1>").unwrap();

        let response = file_response(&path);
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), ContentType::Html);
        assert_eq!(response.body(), b"<h1>hi</h1>");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_404() {
        let response = file_response("/definitely/not/here.css");
        assert_eq!(response.status(), Status::NotFound);
    }
}
