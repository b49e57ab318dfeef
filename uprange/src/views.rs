//! HTML views rendered with minijinja.
//!
//! Templates are compiled into the binary and loaded once at startup.

use minijinja::Environment;

use crate::api::models::upload::UploadPage;

const UPLOAD_TEMPLATE: &str = "upload.html";

pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(UPLOAD_TEMPLATE, include_str!("../templates/upload.html"))?;
        Ok(Self { env })
    }

    pub fn render_upload(&self, page: &UploadPage) -> Result<String, minijinja::Error> {
        self.env.get_template(UPLOAD_TEMPLATE)?.render(page)
    }
}
