use serde::Serialize;

/// A4 纵向, 单位 mm
pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

/// 1pt = 0.3528mm
pub const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const NAVY: Rgb = Rgb(0, 0, 128);
    pub const LAVENDER: Rgb = Rgb(230, 230, 250);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Weight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// 绘制指令; y 为文字基线位置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: Weight,
        align: Align,
        color: Rgb,
        text: String,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    FillRect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// 本页全部文字
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, style: TextStyle) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            size: style.size,
            weight: style.weight,
            align: style.align,
            color: style.color,
            text: text.into(),
        });
    }
}

/// 与输出格式无关的分页文档
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub width: f32,
    pub height: f32,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: PAGE_WIDTH,
            height: PAGE_HEIGHT,
            pages: vec![Page::default()],
        }
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// 在当前页写一行文字
    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, style: TextStyle) {
        self.current().text(text, x, y, style);
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgb) {
        self.current().ops.push(DrawOp::Line { x1, y1, x2, y2, width, color });
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.current().ops.push(DrawOp::FillRect { x, y, w, h, color });
    }

    /// 逐页追加内容 (页脚)
    pub fn for_each_page<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Page),
    {
        for page in &mut self.pages {
            f(page);
        }
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|p| p.contains_text(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub weight: Weight,
    pub align: Align,
    pub color: Rgb,
}

impl TextStyle {
    pub fn normal(size: f32) -> Self {
        Self {
            size,
            weight: Weight::Normal,
            align: Align::Left,
            color: Rgb::NAVY,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            weight: Weight::Bold,
            ..Self::normal(size)
        }
    }

    pub fn centered(self) -> Self {
        Self { align: Align::Center, ..self }
    }

    pub fn right(self) -> Self {
        Self { align: Align::Right, ..self }
    }
}

/// Helvetica 字宽估算 (单位 em)
fn char_width_em(c: char, weight: Weight) -> f32 {
    let w = match c {
        ' ' | '!' | ',' | '.' | ':' | ';' | '\'' | '|' | 'i' | 'j' | 'l' | 'I' => 0.278,
        'f' | 't' | 'r' | '(' | ')' | '-' | '/' | '[' | ']' => 0.333,
        'm' | 'M' => 0.833,
        'w' | 'W' => 0.8,
        '%' | '@' => 0.9,
        c if c.is_ascii_digit() || c == '$' => 0.556,
        c if c.is_ascii_uppercase() => 0.667,
        c if c.is_ascii_lowercase() => 0.52,
        _ => 0.6,
    };
    match weight {
        Weight::Normal => w,
        Weight::Bold => w * 1.06,
    }
}

/// 估算文字宽度 (mm)
pub fn text_width(text: &str, size: f32, weight: Weight) -> f32 {
    text.chars().map(|c| char_width_em(c, weight)).sum::<f32>() * size * PT_TO_MM
}

/// 按宽度折行; 超长单词单独成行
pub fn wrap_text(text: &str, max_width: f32, size: f32, weight: Weight) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width(&candidate, size, weight) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
