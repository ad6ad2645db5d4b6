use crate::bridge::{AppleScriptBridge, Bridge, NullBridge};
use crate::commands::{self, CommandId};
use crate::config;
use crate::core::{Focus, RemoteCore};
use crate::logging;
use crate::model::Settings;
use crate::trivia::TriviaFetcher;
use crate::trivia_net::ChatTriviaFetcher;
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::Rect;
use std::io::{Stdout, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct AppStartupOptions {
    pub config_root: PathBuf,
    pub settings: Settings,
}

pub fn run(options: AppStartupOptions) -> Result<()> {
    let AppStartupOptions {
        config_root,
        settings,
    } = options;
    let log_error = logging::init(&config_root).err();
    if log_error.is_none() {
        logging::install_panic_hook();
    }
    match config::seed_settings(&config_root) {
        Ok(true) => log::info!("wrote default settings to {}", config_root.display()),
        Ok(false) => {}
        Err(err) => log::warn!("could not write default settings: {err:#}"),
    }
    log::info!(
        "starting: app={:?} interval={}ms",
        settings.player_app,
        settings.poll_interval_ms
    );

    let bridge = select_bridge(&settings);
    let fetcher = select_fetcher(&settings);
    let mut core = RemoteCore::new(bridge, fetcher, &settings);
    if let Some(err) = log_error {
        core.set_status(&format!("logging disabled: {err:#}"));
    }
    core.request_poll();

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut last_draw = Instant::now();
    let mut menu_rect = Rect::default();

    let result: Result<()> = loop {
        core.pump_events();
        core.on_timer(Instant::now());

        if core.take_redraw() || last_draw.elapsed() > Duration::from_millis(250) {
            render(&mut terminal, &core, &settings, &mut menu_rect)?;
            last_draw = Instant::now();
        }

        if core.should_quit {
            break Ok(());
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        match event::read()? {
            Event::Mouse(mouse) => handle_mouse(&mut core, mouse, menu_rect),
            Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut core, key),
            Event::Resize(_, _) => core.dirty = true,
            _ => {}
        }

        // An optimistic update reaches the screen before any queued result.
        if core.take_redraw() {
            render(&mut terminal, &core, &settings, &mut menu_rect)?;
            last_draw = Instant::now();
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    log::info!("shutting down");
    result
}

fn render(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    core: &RemoteCore,
    settings: &Settings,
    menu_rect: &mut Rect,
) -> Result<()> {
    terminal.draw(|frame| {
        *menu_rect = crate::ui::menu_rect(frame.area());
        crate::ui::draw(frame, core, &settings.player_app, settings.theme)
    })?;
    Ok(())
}

fn select_bridge(settings: &Settings) -> Arc<dyn Bridge> {
    if AppleScriptBridge::is_supported() {
        Arc::new(AppleScriptBridge::new(&settings.player_app))
    } else {
        log::warn!("osascript not found; running without a player bridge");
        Arc::new(NullBridge::new("player control needs macOS osascript"))
    }
}

fn select_fetcher(settings: &Settings) -> Option<Arc<dyn TriviaFetcher>> {
    let fetcher = ChatTriviaFetcher::from_settings(&settings.trivia)?;
    Some(Arc::new(fetcher))
}

fn handle_key(core: &mut RemoteCore, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        core.dispatch(CommandId::Quit);
        return;
    }

    if core.focus() == Focus::Browse {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => core.browse_cancel(),
            KeyCode::Down | KeyCode::Char('j') => core.browse_move(1),
            KeyCode::Up | KeyCode::Char('k') => core.browse_move(-1),
            KeyCode::PageDown => core.browse_move(10),
            KeyCode::PageUp => core.browse_move(-10),
            KeyCode::Enter => core.browse_select(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Down => core.menu_move(1),
        KeyCode::Up => core.menu_move(-1),
        KeyCode::Enter => core.activate_menu(),
        KeyCode::Right => core.dispatch(CommandId::SeekForward),
        KeyCode::Left => core.dispatch(CommandId::SeekBackward),
        KeyCode::Esc if core.browse.pending().is_some() => core.browse_cancel(),
        KeyCode::Char(ch) => {
            if let Some(command) = commands::command_for_key(ch) {
                core.dispatch(command);
            }
        }
        _ => {}
    }
}

fn handle_mouse(core: &mut RemoteCore, mouse: MouseEvent, menu_rect: Rect) {
    if core.focus() == Focus::Browse {
        match mouse.kind {
            MouseEventKind::ScrollDown => core.browse_move(1),
            MouseEventKind::ScrollUp => core.browse_move(-1),
            _ => {}
        }
        return;
    }

    let inside_menu = point_in_rect(mouse.column, mouse.row, menu_rect);
    match mouse.kind {
        MouseEventKind::ScrollDown if inside_menu => core.menu_move(1),
        MouseEventKind::ScrollUp if inside_menu => core.menu_move(-1),
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeError, Operation};
    use crate::commands::COMMANDS;
    use crossterm::event::KeyEventState;

    struct SilentBridge;

    impl Bridge for SilentBridge {
        fn run(&self, _operation: &Operation) -> Result<String, BridgeError> {
            Ok(String::new())
        }
    }

    fn fresh_core() -> RemoteCore {
        RemoteCore::new(Arc::new(SilentBridge), None, &Settings::default())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn scroll(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn quit_key_and_ctrl_c_stop_the_loop() {
        let mut core = fresh_core();
        handle_key(&mut core, press(KeyCode::Char('q')));
        assert!(core.should_quit);

        let mut core = fresh_core();
        handle_key(
            &mut core,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(core.should_quit);
    }

    #[test]
    fn arrows_move_menu_selection() {
        let mut core = fresh_core();
        handle_key(&mut core, press(KeyCode::Down));
        handle_key(&mut core, press(KeyCode::Down));
        handle_key(&mut core, press(KeyCode::Up));
        assert_eq!(core.menu_selected, 1);
    }

    #[test]
    fn enter_on_quit_entry_quits() {
        let mut core = fresh_core();
        let quit_row = COMMANDS
            .iter()
            .position(|command| command.id == CommandId::Quit)
            .expect("quit in menu");
        core.menu_move(quit_row as isize);
        handle_key(&mut core, press(KeyCode::Enter));
        assert!(core.should_quit);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut core = fresh_core();
        let before = core.status.clone();
        handle_key(&mut core, press(KeyCode::Char('z')));
        assert_eq!(core.status, before);
        assert!(!core.should_quit);
    }

    #[test]
    fn wheel_moves_menu_only_inside_rect() {
        let mut core = fresh_core();
        let rect = Rect::new(0, 10, 30, 12);

        handle_mouse(&mut core, scroll(MouseEventKind::ScrollDown, 50, 12), rect);
        assert_eq!(core.menu_selected, 0);

        handle_mouse(&mut core, scroll(MouseEventKind::ScrollDown, 5, 12), rect);
        assert_eq!(core.menu_selected, 1);
    }

    #[test]
    fn empty_rect_contains_nothing() {
        assert!(!point_in_rect(0, 0, Rect::default()));
        assert!(point_in_rect(3, 3, Rect::new(2, 2, 2, 2)));
        assert!(!point_in_rect(4, 3, Rect::new(2, 2, 2, 2)));
    }
}
