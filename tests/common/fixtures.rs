use secnum::{HostDom, MemoryDom, NodeId};

/// A page shaped like Notion's block markup: each heading sits two levels
/// below its block container, inside `.notion-page-content`.
pub struct NotionPage {
    pub dom: MemoryDom,
    pub content: NodeId,
    pub headings: Vec<NodeId>,
}

const BLOCKS: [(&str, &str); 3] = [
    ("notion-header-block", "h2"),
    ("notion-sub_header-block", "h3"),
    ("notion-sub_sub_header-block", "h4"),
];

impl NotionPage {
    pub fn new() -> Self {
        let mut dom = MemoryDom::new();
        let body = dom.body_id();
        let app = dom.append_element(body, "div", &[("class", "notion-app-inner")]);
        let content = dom.append_element(app, "div", &[("class", "notion-page-content")]);
        Self {
            dom,
            content,
            headings: Vec::new(),
        }
    }

    /// Builds a heading block at the end of the content container.
    fn block(&mut self, level: usize, text: &str) -> (NodeId, NodeId) {
        let (block_class, tag) = BLOCKS[level - 1];
        let block = self
            .dom
            .append_element(self.content, "div", &[("class", block_class)]);
        let inner = self.dom.append_element(block, "div", &[]);
        let heading = self
            .dom
            .append_element(inner, tag, &[("contenteditable", "true")]);
        self.dom.append_text(heading, text);
        (block, heading)
    }

    /// Appends a heading block for `level` (1..=3) and returns the heading
    /// element.
    pub fn heading(&mut self, level: usize, text: &str) -> NodeId {
        let (_, heading) = self.block(level, text);
        self.headings.push(heading);
        heading
    }

    /// Inserts a heading block in front of the block holding `before`.
    pub fn heading_before(&mut self, level: usize, text: &str, before: NodeId) -> NodeId {
        let (block, heading) = self.block(level, text);
        let reference = self.block_of(before);
        self.dom.insert_before(self.content, block, reference);
        heading
    }

    /// The block container two levels above a heading.
    pub fn block_of(&self, heading: NodeId) -> Option<NodeId> {
        let inner = self.dom.parent(&heading)?;
        self.dom.parent(&inner)
    }

    pub fn paragraph(&mut self, text: &str) -> NodeId {
        let block = self
            .dom
            .append_element(self.content, "div", &[("class", "notion-text-block")]);
        self.dom.append_text(block, text);
        block
    }

    pub fn with_headings(levels: &[(usize, &str)]) -> Self {
        let mut page = Self::new();
        for (level, text) in levels {
            page.heading(*level, text);
        }
        page
    }
}

/// A plain page: `h1`..`h6` directly in the body.
pub fn plain_page(levels: &[(usize, &str)]) -> (MemoryDom, Vec<NodeId>) {
    let mut dom = MemoryDom::new();
    let body = dom.body_id();
    let headings = levels
        .iter()
        .map(|(level, text)| {
            let h = dom.append_element(body, &format!("h{}", level), &[]);
            dom.append_text(h, text);
            h
        })
        .collect();
    (dom, headings)
}
