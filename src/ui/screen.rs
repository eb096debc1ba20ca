use ratatui::Frame;

use crate::{
    ui::{analysis::render_analysis, help::render_help},
    App, AppState,
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Typing and results both go through the App widget
pub struct SessionScreen;

impl Screen for SessionScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

pub struct AnalysisScreen;

impl Screen for AnalysisScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        render_analysis(app, area, f.buffer_mut());
    }
}

/// Key overview shown before the first test
pub struct HelpScreen;

impl Screen for HelpScreen {
    fn render(&self, _app: &App, f: &mut Frame) {
        let area = f.area();
        render_help(area, f.buffer_mut());
    }
}

pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::Help => Box::new(HelpScreen),
        AppState::Typing | AppState::Results => Box::new(SessionScreen),
        AppState::Analysis => Box::new(AnalysisScreen),
    }
}
