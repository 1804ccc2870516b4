#![allow(non_snake_case)]
use std::fmt;
use std::rc::Rc;

pub type Callback = Rc<dyn Fn()>;

/// A tiny view tree: enough to show a value and wire buttons to it.
#[derive(Clone)]
pub enum View {
    Text(String),
    Button { label: String, on_click: Callback },
    Column(Vec<View>),
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Text(text) => f.debug_tuple("Text").field(text).finish(),
            View::Button { label, .. } => f.debug_struct("Button").field("label", label).finish(),
            View::Column(children) => f.debug_tuple("Column").field(children).finish(),
        }
    }
}

impl View {
    /// One line per leaf, indented by nesting depth.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        self.write_lines(0, &mut out);
        out
    }

    fn write_lines(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self {
            View::Text(text) => {
                out.push_str(&indent);
                out.push_str(text);
                out.push('\n');
            }
            View::Button { label, .. } => {
                out.push_str(&format!("{indent}[{label}]\n"));
            }
            View::Column(children) => {
                for child in children {
                    child.write_lines(depth + 1, out);
                }
            }
        }
    }

    /// First button (depth-first) with this label.
    pub fn find_button(&self, label: &str) -> Option<Callback> {
        match self {
            View::Button { label: l, on_click } if l == label => Some(on_click.clone()),
            View::Column(children) => children.iter().find_map(|c| c.find_button(label)),
            _ => None,
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        match self {
            View::Text(text) => vec![text.as_str()],
            View::Button { .. } => Vec::new(),
            View::Column(children) => children.iter().flat_map(View::texts).collect(),
        }
    }
}

pub fn Text(text: impl Into<String>) -> View {
    View::Text(text.into())
}

pub fn Button(label: impl Into<String>, on_click: impl Fn() + 'static) -> View {
    View::Button {
        label: label.into(),
        on_click: Rc::new(on_click),
    }
}

pub fn Column(children: Vec<View>) -> View {
    View::Column(children)
}
