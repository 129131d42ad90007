//! Content elements and their ordering

use std::cmp::Ordering;
use std::sync::Arc;

/// A database object held by a dynamic content
pub trait ContentElement: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Distinguishes overloaded program units sharing one name
    fn overload(&self) -> u16 {
        0
    }

    /// Called on elements that survive a forced reload
    fn refresh(&self) {}

    /// Release resources held by the element
    fn dispose(&self) {}
}

/// Orders the elements of a content before they are published
pub trait ElementSorter<T>: Send + Sync {
    fn sort(&self, elements: &mut [Arc<T>]);
}

/// Case-insensitive name order, then overload
#[derive(Debug, Clone, Copy, Default)]
pub struct NameSorter;

impl NameSorter {
    fn compare<T: ContentElement>(left: &T, right: &T) -> Ordering {
        let by_name = left
            .name()
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(right.name().chars().flat_map(char::to_lowercase));
        by_name.then_with(|| left.overload().cmp(&right.overload()))
    }
}

impl<T: ContentElement> ElementSorter<T> for NameSorter {
    fn sort(&self, elements: &mut [Arc<T>]) {
        elements.sort_by(|left, right| Self::compare(left.as_ref(), right.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Procedure {
        name: &'static str,
        overload: u16,
    }

    impl ContentElement for Procedure {
        fn name(&self) -> &str {
            self.name
        }

        fn overload(&self) -> u16 {
            self.overload
        }
    }

    #[test]
    fn test_name_sorter_ignores_case_then_uses_overload() {
        let mut elements: Vec<Arc<Procedure>> = [
            ("payroll", 2),
            ("Audit", 0),
            ("PAYROLL", 1),
            ("bonus", 0),
        ]
        .into_iter()
        .map(|(name, overload)| Arc::new(Procedure { name, overload }))
        .collect();

        NameSorter.sort(&mut elements);

        let order: Vec<_> = elements
            .iter()
            .map(|element| (element.name, element.overload))
            .collect();
        assert_eq!(
            order,
            vec![("Audit", 0), ("bonus", 0), ("PAYROLL", 1), ("payroll", 2)]
        );
    }
}
