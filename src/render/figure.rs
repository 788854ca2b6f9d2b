//! Backend-independent description of a chart image.

use crate::stats::Bin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    SkyBlue,
    LightGreen,
    LightCoral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    Histogram { bins: Vec<Bin>, fill: Fill },
    Bars { bars: Vec<Bar>, fill: Fill },
    /// Placeholder text drawn in place of a plot.
    Message(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub subtitle: Option<String>,
    pub x_label: String,
    pub y_label: String,
    pub body: PanelBody,
}

impl Panel {
    pub fn message(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            x_label: String::new(),
            y_label: String::new(),
            body: PanelBody::Message(message.into()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, PanelBody::Message(_))
    }

    pub fn caption(&self) -> String {
        match &self.subtitle {
            Some(subtitle) => format!("{}  ({subtitle})", self.title),
            None => self.title.clone(),
        }
    }
}

/// Panels laid out left to right on one canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn single(width: u32, height: u32, panel: Panel) -> Self {
        Self {
            width,
            height,
            panels: vec![panel],
        }
    }
}
