use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tera::Tera;

static TERA: OnceLock<Tera> = OnceLock::new();

/// Looks for `templates/` in the working directory first, then next to the
/// crate manifest so tests and `cargo run` from elsewhere still find it.
fn template_dir() -> PathBuf {
    let local = Path::new("templates");
    if local.is_dir() {
        return local.to_path_buf();
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

pub fn get_tera() -> &'static Tera {
    TERA.get_or_init(|| {
        let pattern = template_dir().join("**").join("*.html");
        match Tera::new(&pattern.to_string_lossy()) {
            Ok(tera) => tera,
            Err(e) => {
                tracing::error!("Failed to load templates: {}", e);
                Tera::default()
            }
        }
    })
}
