use crate::element::element_model::{ElementType, PageElement, PageSection};

/// Element types that form page sections, in emission order.
pub const SECTION_TYPES: [ElementType; 5] = [
    ElementType::Header,
    ElementType::Footer,
    ElementType::Navigation,
    ElementType::Form,
    ElementType::Modal,
];

/// Group elements into sections. Types with no elements produce no section.
pub fn categorize_sections(elements: &[PageElement]) -> Vec<PageSection> {
    SECTION_TYPES
        .iter()
        .filter_map(|&section_type| {
            let members: Vec<PageElement> = elements
                .iter()
                .filter(|e| e.element_type == section_type)
                .cloned()
                .collect();

            let selector = members.first()?.selector.clone();
            Some(PageSection {
                name: section_type.display_name(),
                section_type,
                elements: members,
                selector,
            })
        })
        .collect()
}
