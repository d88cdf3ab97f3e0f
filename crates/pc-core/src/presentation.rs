//! Presentation sequencer: which frames are slides, and in what order.
//!
//! The sequence lives on the frames themselves (`presentationOrder`).
//! Every edit rewrites the whole sequence, so listed frames always carry
//! `0..n` and every other frame carries `None`.

use crate::document::Document;
use crate::id::ElementId;
use crate::model::Element;
use crate::order::DropPosition;

impl Document {
    /// Frames in the presentation, first slide first.
    pub fn slides(&self) -> Vec<Element> {
        let mut slides: Vec<(u32, &Element)> = self
            .store
            .iter()
            .filter_map(|el| el.presentation_order().map(|n| (n, el)))
            .collect();
        slides.sort_by(|(a, ea), (b, eb)| a.cmp(b).then_with(|| ea.id.as_str().cmp(eb.id.as_str())));
        slides.into_iter().map(|(_, el)| el.clone()).collect()
    }

    fn slide_ids(&self) -> Vec<ElementId> {
        self.slides().iter().map(|el| el.id).collect()
    }

    /// Replace the sequence. Unknown ids, non-frames and repeats are
    /// skipped. Returns every frame whose order was assigned or cleared.
    pub fn set_presentation_order(&mut self, ids: &[ElementId]) -> Vec<Element> {
        let mut order: Vec<ElementId> = Vec::with_capacity(ids.len());
        for id in ids {
            let is_frame = self.store.get(*id).is_some_and(|el| el.as_frame().is_some());
            if is_frame && !order.contains(id) {
                order.push(*id);
            } else if !is_frame {
                log::debug!("presentation: skipping {id}, not a frame on this canvas");
            }
        }

        let mut affected = Vec::new();
        for (n, id) in order.iter().enumerate() {
            if let Some(el) = self.store.get_mut(*id)
                && let Some(frame) = el.as_frame_mut()
            {
                frame.presentation_order = Some(n as u32);
                affected.push(el.clone());
            }
        }

        let mut cleared: Vec<ElementId> = self
            .store
            .iter()
            .filter(|el| el.presentation_order().is_some() && !order.contains(&el.id))
            .map(|el| el.id)
            .collect();
        cleared.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for id in cleared {
            if let Some(el) = self.store.get_mut(id)
                && let Some(frame) = el.as_frame_mut()
            {
                frame.presentation_order = None;
                affected.push(el.clone());
            }
        }

        log::debug!("presentation: {} slide(s)", order.len());
        affected
    }

    /// Append `id` to the end of the sequence unless it is already in it.
    pub fn add_to_presentation(&mut self, id: ElementId) -> Vec<Element> {
        if !self.store.get(id).is_some_and(|el| el.as_frame().is_some()) {
            log::warn!("add_to_presentation: {id} is not a frame");
            return Vec::new();
        }
        let mut order = self.slide_ids();
        if !order.contains(&id) {
            order.push(id);
        }
        self.set_presentation_order(&order)
    }

    /// Move a slide before (`Above`) or after (`Below`) another slide.
    pub fn reorder_slide(
        &mut self,
        dragged: ElementId,
        target: ElementId,
        position: DropPosition,
    ) -> Vec<Element> {
        let mut order = self.slide_ids();
        let Some(from) = order.iter().position(|id| *id == dragged) else {
            log::warn!("reorder_slide: {dragged} is not a slide");
            return Vec::new();
        };
        order.remove(from);
        let Some(t) = order.iter().position(|id| *id == target) else {
            log::warn!("reorder_slide: {target} is not a slide");
            return Vec::new();
        };
        let slot = match position {
            DropPosition::Above => t,
            DropPosition::Below => t + 1,
        };
        order.insert(slot, dragged);
        self.set_presentation_order(&order)
    }
}
