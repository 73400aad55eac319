/// 纵向排版游标 (单位 mm, 原点左上)
///
/// 只负责位置与分页判断, 不涉及绘制。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentCursor {
    y: f32,
    page_height: f32,
    /// 续页起始位置
    top: f32,
    /// 页脚上方的保留高度
    bottom_margin: f32,
}

impl DocumentCursor {
    pub fn new(page_height: f32, top: f32, bottom_margin: f32) -> Self {
        Self {
            y: top,
            page_height,
            top,
            bottom_margin,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    /// 内容可用的最低位置
    pub fn limit(&self) -> f32 {
        self.page_height - self.bottom_margin
    }

    /// 直接定位 (不分页)
    pub fn move_to(&mut self, y: f32) {
        self.y = y;
    }

    /// 换页, 游标回到续页顶部
    pub fn break_page(&mut self) {
        self.y = self.top;
    }

    /// 保证还能放下 `height`, 放不下则换页; 返回是否换页
    pub fn ensure(&mut self, height: f32) -> bool {
        if self.y + height > self.limit() && self.y > self.top {
            self.break_page();
            true
        } else {
            false
        }
    }

    /// 占用 `height`, 必要时先换页; 返回 (新位置, 是否换页)
    pub fn advance(&mut self, height: f32) -> (f32, bool) {
        let page_break = self.ensure(height);
        self.y += height;
        (self.y, page_break)
    }
}
