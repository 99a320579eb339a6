// Template rendering (tera). Templates are compiled into the binary.

use tera::{Context, Tera};
use thiserror::Error;

use crate::view::DashboardView;

pub const DASHBOARD_TEMPLATE: &str = "dashboard.html";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            DASHBOARD_TEMPLATE,
            include_str!("../templates/dashboard.html"),
        )?;
        Ok(Self { tera })
    }

    /// Renders `template` with exactly the fields of `view` in scope.
    pub fn render(&self, template: &str, view: &DashboardView) -> Result<String, RenderError> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(template, &context)?)
    }

    pub fn render_dashboard(&self, view: &DashboardView) -> Result<String, RenderError> {
        self.render(DASHBOARD_TEMPLATE, view)
    }
}
