use std::collections::VecDeque;

use crate::filter::FilterCriteria;
use crate::pipeline::{DashboardView, Pipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    RawData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFocus {
    Teams,
    Positions,
}

pub struct AppState {
    pub pipeline: Pipeline,
    pub screen: Screen,
    pub focus: FilterFocus,
    pub teams: Vec<String>,
    pub positions: Vec<String>,
    pub team_cursor: usize,
    pub position_cursor: usize,
    pub criteria: FilterCriteria,
    pub view: DashboardView,
    pub raw_scroll: u16,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, default_team_count: usize) -> Self {
        let teams = pipeline.team_options();
        let positions = pipeline.position_options();
        let criteria = FilterCriteria::initial(&teams, &positions, default_team_count);
        let view = pipeline.run(&criteria);
        let mut state = Self {
            pipeline,
            screen: Screen::Dashboard,
            focus: FilterFocus::Teams,
            teams,
            positions,
            team_cursor: 0,
            position_cursor: 0,
            criteria,
            view,
            raw_scroll: 0,
            help_overlay: false,
            logs: VecDeque::with_capacity(200),
        };
        let dropped = state.pipeline.dropped();
        if dropped > 0 {
            state.push_log(format!(
                "[INFO] {dropped} record(s) skipped: missing recovery dates, team or position"
            ));
        }
        state
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FilterFocus::Teams => FilterFocus::Positions,
            FilterFocus::Positions => FilterFocus::Teams,
        };
    }

    pub fn toggle_raw_data(&mut self) {
        self.screen = match self.screen {
            Screen::Dashboard => Screen::RawData,
            Screen::RawData => Screen::Dashboard,
        };
        self.raw_scroll = 0;
    }

    pub fn select_next(&mut self) {
        if self.screen == Screen::RawData {
            let max = u16::try_from(self.view.records.len().saturating_sub(1)).unwrap_or(u16::MAX);
            self.raw_scroll = self.raw_scroll.saturating_add(1).min(max);
            return;
        }
        let (cursor, total) = self.focused_cursor();
        if total == 0 {
            *cursor = 0;
            return;
        }
        *cursor = (*cursor + 1) % total;
    }

    pub fn select_prev(&mut self) {
        if self.screen == Screen::RawData {
            self.raw_scroll = self.raw_scroll.saturating_sub(1);
            return;
        }
        let (cursor, total) = self.focused_cursor();
        if total == 0 {
            *cursor = 0;
            return;
        }
        *cursor = if *cursor == 0 { total - 1 } else { *cursor - 1 };
    }

    pub fn toggle_under_cursor(&mut self) {
        match self.focus {
            FilterFocus::Teams => {
                let Some(team) = self.teams.get(self.team_cursor).cloned() else {
                    return;
                };
                self.criteria.toggle_team(&team);
            }
            FilterFocus::Positions => {
                let Some(position) = self.positions.get(self.position_cursor).cloned() else {
                    return;
                };
                self.criteria.toggle_position(&position);
            }
        }
        self.refresh();
    }

    pub fn select_all_focused(&mut self) {
        match self.focus {
            FilterFocus::Teams => self.criteria.teams = self.teams.iter().cloned().collect(),
            FilterFocus::Positions => {
                self.criteria.positions = self.positions.iter().cloned().collect()
            }
        }
        self.refresh();
    }

    pub fn clear_focused(&mut self) {
        match self.focus {
            FilterFocus::Teams => self.criteria.teams.clear(),
            FilterFocus::Positions => self.criteria.positions.clear(),
        }
        self.refresh();
    }

    pub fn is_selected(&self, focus: FilterFocus, value: &str) -> bool {
        match focus {
            FilterFocus::Teams => self.criteria.teams.contains(value),
            FilterFocus::Positions => self.criteria.positions.contains(value),
        }
    }

    pub fn result_column_names(&self) -> Vec<String> {
        self.pipeline
            .missed_match_columns()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn refresh(&mut self) {
        self.view = self.pipeline.run(&self.criteria);
        self.raw_scroll = 0;
    }

    fn focused_cursor(&mut self) -> (&mut usize, usize) {
        match self.focus {
            FilterFocus::Teams => (&mut self.team_cursor, self.teams.len()),
            FilterFocus::Positions => (&mut self.position_cursor, self.positions.len()),
        }
    }
}
