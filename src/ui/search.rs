//! Free-text node search — a top-bar filter box scored with the skim fuzzy
//! matcher. Matches get labels and a tinted ring, and the filter text rides
//! along in the captured view state.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::collections::HashSet;

use crate::core::graph::{GraphModel, NodeId};
use crate::core::settings::{SearchSettings, Settings};
use crate::host::{DataGeneration, RedrawFlags};

/// Node ids matching the current filter text, cached per (query, data
/// generation) so scoring runs only when either changes.
#[derive(Resource, Default)]
pub struct SearchMatches {
    pub ids: HashSet<NodeId>,
    query: String,
    generation: u64,
}

/// Score every node label against the filter. Empty filter matches nothing
/// (no ring noise on an unfiltered graph).
pub fn compute_matches(graph: &GraphModel, search: &SearchSettings) -> HashSet<NodeId> {
    if search.filter_text.is_empty() {
        return HashSet::new();
    }
    let matcher = SkimMatcherV2::default();
    let query = if search.case_insensitive {
        search.filter_text.to_lowercase()
    } else {
        search.filter_text.clone()
    };

    graph
        .nodes()
        .iter()
        .filter(|node| {
            let label = if search.case_insensitive {
                node.label.to_lowercase()
            } else {
                node.label.clone()
            };
            matcher.fuzzy_match(&label, &query).is_some()
        })
        .map(|node| node.id.clone())
        .collect()
}

/// Refreshes the match cache when the filter text or the data changed, and
/// raises the label redraw flag so match labels appear.
pub fn update_search_matches_system(
    graph: Res<GraphModel>,
    settings: Res<Settings>,
    generation: Res<DataGeneration>,
    mut matches: ResMut<SearchMatches>,
    mut flags: ResMut<RedrawFlags>,
) {
    if matches.query == settings.search.filter_text && matches.generation == generation.0 {
        return;
    }
    matches.ids = compute_matches(&graph, &settings.search);
    matches.query = settings.search.filter_text.clone();
    matches.generation = generation.0;
    flags.redraw_labels();
}

/// Top bar with the filter box and a node/match count readout.
pub fn search_bar_ui_system(
    mut contexts: EguiContexts,
    mut settings: ResMut<Settings>,
    graph: Res<GraphModel>,
    matches: Res<SearchMatches>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::TopBottomPanel::top("search_bar")
        .default_height(32.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Filter:");
                ui.add(
                    egui::TextEdit::singleline(&mut settings.search.filter_text)
                        .hint_text("Search nodes...")
                        .desired_width(240.0),
                );
                if !settings.search.filter_text.is_empty() {
                    if ui.button("✕").clicked() {
                        settings.search.filter_text.clear();
                    }
                    ui.label(format!(
                        "{} / {} node(s)",
                        matches.ids.len(),
                        graph.nodes().len()
                    ));
                } else {
                    ui.label(format!("{} node(s)", graph.nodes().len()));
                }
            });
        });
}
