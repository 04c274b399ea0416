//! Widget operations. Widgets are page-scoped and ordered only among
//! themselves.

use crate::model::layout::{Layout, Widget, WidgetSize, WidgetType};
use crate::mutation::{edit_layout, renumber_widgets, splice};

pub fn add_widget(
    layout: &Layout,
    page_index: usize,
    kind: WidgetType,
    size: WidgetSize,
) -> Layout {
    edit_layout(layout, |next| {
        let Some(page) = next.pages.get_mut(page_index) else {
            return false;
        };
        let position = page.widgets.len();
        page.widgets.push(Widget::new(kind, size, position));
        true
    })
}

pub fn remove_widget(layout: &Layout, page_index: usize, widget_id: &str) -> Layout {
    edit_layout(layout, |next| {
        let Some(page) = next.pages.get_mut(page_index) else {
            return false;
        };
        let Some(index) = page.widget_index(widget_id) else {
            return false;
        };
        page.widgets.remove(index);
        renumber_widgets(&mut page.widgets);
        true
    })
}

pub fn reorder_widgets(
    layout: &Layout,
    page_index: usize,
    from_index: usize,
    to_index: usize,
) -> Layout {
    edit_layout(layout, |next| {
        let Some(page) = next.pages.get_mut(page_index) else {
            return false;
        };
        if !splice(&mut page.widgets, from_index, to_index) {
            return false;
        }
        renumber_widgets(&mut page.widgets);
        true
    })
}
