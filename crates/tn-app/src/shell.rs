//! Headless tab shell driven by script commands

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tn_core::{
    MemoryContainer, Navigator, NavigatorEvent, RootView, Subscription, View, ViewContainer,
    ViewRef,
};
use tracing::info;

use crate::config::ShellConfig;
use crate::script::ScriptCommand;

/// A named screen
#[derive(Debug)]
pub struct Screen {
    pub name: String,
}

impl Screen {
    pub fn new(name: impl Into<String>) -> ViewRef {
        Arc::new(Self { name: name.into() })
    }
}

impl View for Screen {
    fn type_name(&self) -> &str {
        "Screen"
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn screen_name(view: &ViewRef) -> String {
    view.name().to_string()
}

pub struct Shell {
    config: ShellConfig,
    navigator: Arc<Navigator<String>>,
    container: Arc<MemoryContainer>,
    notices: Arc<Mutex<Vec<String>>>,
    _event_log: Subscription<NavigatorEvent<String>>,
    _scroll_log: Subscription<ViewRef>,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Result<Self> {
        Self::with_container(config, Arc::new(MemoryContainer::new()))
    }

    fn with_container(config: ShellConfig, container: Arc<MemoryContainer>) -> Result<Self> {
        config.validate()?;

        let mut builder = Navigator::builder(config.default_tab.clone())
            .settings(config.navigator.clone());
        for tab in &config.tabs {
            let root = tab.root.clone();
            let detachable = tab.detachable.unwrap_or(config.navigator.detach_by_default);
            builder = builder.tab_with_detachability(tab.key.clone(), move || {
                RootView::new(Screen::new(root.clone()), detachable)
            });
        }
        let navigator = Arc::new(builder.build()?);

        let notices = Arc::new(Mutex::new(Vec::new()));
        let event_log = {
            let notices = notices.clone();
            navigator.events().subscribe(move |event: &NavigatorEvent<String>| {
                let notice = describe(event);
                info!("{}", notice);
                notices.lock().push(notice);
            })
        };
        let scroll_log = {
            let notices = notices.clone();
            navigator.scroll_to_top().subscribe(move |view: &ViewRef| {
                let notice = format!("scroll {} to top", screen_name(view));
                info!("{}", notice);
                notices.lock().push(notice);
            })
        };

        navigator.attach(container.clone())?;

        Ok(Self {
            config,
            navigator,
            container,
            notices,
            _event_log: event_log,
            _scroll_log: scroll_log,
        })
    }

    pub fn navigator(&self) -> &Navigator<String> {
        &self.navigator
    }

    pub fn container(&self) -> &MemoryContainer {
        &self.container
    }

    /// Notices produced since the last call
    pub fn take_notices(&self) -> Vec<String> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn execute(&mut self, command: ScriptCommand) -> Result<()> {
        match command {
            ScriptCommand::Push { screen, tab } => {
                let view = Screen::new(screen);
                match tab {
                    Some(tab) => self.navigator.push_to(tab, view)?,
                    None => self.navigator.push(view)?,
                }
            }
            ScriptCommand::Pop { result } => {
                let popped = match result {
                    Some(result) => self.navigator.pop_with_result(result)?,
                    None => self.navigator.pop()?,
                };
                if !popped {
                    self.notices.lock().push("nothing to pop".to_string());
                }
            }
            ScriptCommand::Tap { tab } => self.navigator.select_tab(tab)?,
            ScriptCommand::Switch { tab } => self.navigator.switch_tab(tab)?,
            ScriptCommand::Reset { tab, new_root } => self.navigator.reset(tab, new_root)?,
            ScriptCommand::Root { tab, screen } => {
                self.navigator.add_root_view(tab, Screen::new(screen))?
            }
            ScriptCommand::Clear => self.navigator.clear_all()?,
            ScriptCommand::State => {
                let report = self.report();
                self.notices.lock().extend(report);
            }
            ScriptCommand::Recreate => self.recreate()?,
        }
        Ok(())
    }

    /// One line per tab with its stack, plus the visible screens
    pub fn report(&self) -> Vec<String> {
        let current = self.navigator.current_tab();
        let mut lines: Vec<String> = self
            .navigator
            .tabs()
            .map(|tab| {
                let marker = if current.as_ref() == Some(tab) { "*" } else { " " };
                let stack: Vec<String> = self
                    .navigator
                    .stack(tab)
                    .iter()
                    .filter_map(|identity| {
                        self.container.find(&identity.encode()).map(|view| screen_name(&view))
                    })
                    .collect();
                format!("{} {}: [{}]", marker, tab, stack.join(", "))
            })
            .collect();

        let visible: Vec<String> = self.container.visible_views().iter().map(screen_name).collect();
        lines.push(format!("visible: [{}]", visible.join(", ")));
        lines
    }

    /// Throw the navigator away and restore the container from saved state,
    /// the way a host does after the process was killed
    fn recreate(&mut self) -> Result<()> {
        let saved = self.container.save();
        let container = Arc::new(MemoryContainer::restore(&saved, |tag| self.container.find(tag)));
        info!("Recreating shell from {} saved views", saved.len());

        let mut notices = self.take_notices();
        notices.push("recreated".to_string());

        *self = Self::with_container(self.config.clone(), container)
            .context("Failed to recreate shell")?;
        notices.extend(self.take_notices());
        *self.notices.lock() = notices;
        Ok(())
    }
}

fn describe(event: &NavigatorEvent<String>) -> String {
    match event {
        NavigatorEvent::TabSwitched { previous_tab, new_tab } => {
            format!("switched {} -> {}", previous_tab, new_tab)
        }
        NavigatorEvent::ViewAdded { view, .. } => format!("added {}", screen_name(view)),
        NavigatorEvent::ViewRemoved { view, .. } => format!("removed {}", screen_name(view)),
        NavigatorEvent::ViewRemovedWithResult { view, result, .. } => {
            format!("removed {} with {}", screen_name(view), result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parse_line;

    fn run(shell: &mut Shell, lines: &[&str]) {
        for line in lines {
            if let Some(command) = parse_line(line).unwrap() {
                shell.execute(command).unwrap();
            }
        }
    }

    #[test]
    fn test_shell_starts_on_default_tab() {
        let shell = Shell::new(ShellConfig::default()).unwrap();

        assert_eq!(shell.take_notices(), vec!["added feed"]);
        assert_eq!(shell.navigator().current_tab().as_deref(), Some("home"));
    }

    #[test]
    fn test_script_flow() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        shell.take_notices();

        run(&mut shell, &["push post", "push query search", "pop {\"ok\": true}", "pop"]);

        assert_eq!(
            shell.take_notices(),
            vec![
                "added post",
                "switched home -> search",
                "added explore",
                "added query",
                "removed query with {\"ok\":true}",
                "switched search -> home",
                "removed explore",
            ]
        );
        assert_eq!(shell.report().last().unwrap(), "visible: [post]");
    }

    #[test]
    fn test_third_tap_scrolls() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        run(&mut shell, &["switch search", "tap home", "tap home", "tap home"]);

        assert_eq!(shell.take_notices().last().unwrap(), "scroll feed to top");
    }

    #[test]
    fn test_recreate_keeps_one_view() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        run(&mut shell, &["push post", "push query search", "recreate"]);

        assert_eq!(shell.container().len(), 1);
        assert!(shell.take_notices().contains(&"recreated".to_string()));
        assert_eq!(shell.report()[0], "* home: [feed]");
    }

    #[test]
    fn test_screen_names_are_reported_verbatim() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        shell.take_notices();

        run(&mut shell, &[r"push a\b", r#"push x"y"#]);

        assert_eq!(shell.take_notices(), vec![r"added a\b", r#"added x"y"#]);
    }

    #[test]
    fn test_unknown_tab_is_an_error() {
        let mut shell = Shell::new(ShellConfig::default()).unwrap();
        let command = parse_line("switch settings").unwrap().unwrap();

        assert!(shell.execute(command).is_err());
    }
}
