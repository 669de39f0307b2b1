//! JavaScript shipped across the page boundary.
//!
//! The snapshot script must compute DOM paths exactly like
//! [`crate::dom::snapshot::dom_path`]: one `/tag[n]` segment per
//! element, where `n` is the 1-based position among same-tag element siblings.
//! It ships the element tree itself rather than markup, in the shape of
//! [`crate::dom::snapshot::SnapshotElement`].

pub const DOM_SNAPSHOT: &str = r#"(() => {
  const domPath = (el) => {
    const parts = [];
    for (let node = el; node && node.nodeType === 1; node = node.parentElement) {
      let index = 1;
      for (let sib = node.previousElementSibling; sib; sib = sib.previousElementSibling) {
        if (sib.localName === node.localName) index++;
      }
      parts.unshift(`${node.localName.toLowerCase()}[${index}]`);
    }
    return '/' + parts.join('/');
  };
  const capture = (el) => ({
    tag: el.localName,
    namespace: el.namespaceURI,
    attributes: Array.from(el.attributes, (a) => [a.name, a.value]),
    children: Array.from(el.childNodes).flatMap((child) => {
      if (child.nodeType === 1) return [capture(child)];
      if (child.nodeType === 3) return [child.data];
      return [];
    }),
  });
  const styles = {};
  for (const el of document.querySelectorAll('*')) {
    const c = window.getComputedStyle(el);
    styles[domPath(el)] = {
      display: c.display,
      position: c.position,
      width: c.width,
      height: c.height,
      backgroundColor: c.backgroundColor,
      color: c.color,
      fontSize: c.fontSize,
      fontWeight: c.fontWeight,
      padding: c.padding,
      margin: c.margin,
      border: c.border,
      zIndex: c.zIndex,
      cursor: c.cursor,
    };
  }
  return { root: capture(document.documentElement), styles };
})()"#;

pub const TITLE: &str = "document.title";

pub const SCROLL_HEIGHT: &str = "document.body.scrollHeight";

pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";
