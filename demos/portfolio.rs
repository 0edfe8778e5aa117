//! Terminal portfolio page: typing hero, sections revealed while scrolling.
//!
//! Run with `cargo run --example portfolio`.
//! Keys: j/k or arrows scroll, space/PgDn page, g/G top/bottom, q quits.
//!
//! Optional files in the working directory:
//! - `motion.toml` overrides animation settings
//! - `hero.json` stands in for the CMS hero document
//!
//! Logs go to `folio-motion-demo.log` in the temp directory
//! (`RUST_LOG=folio_motion=trace` for every state transition).

use std::io::{self, Stdout, Write};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind},
    execute, queue,
    style::{Attribute, Print, SetAttribute},
    terminal::{self, ClearType},
};
use tracing_subscriber::EnvFilter;

use folio_motion::{
    resolve, CyclingTypewriter, Direction, ElementId, HeroContent, HeroOverrides, MotionConfig,
    MotionError, Rect, RevealConfig, RevealController, RevealHandle, RevealState, TimerQueue,
    Transition, TypewriterHandle, Viewport,
};

/// Document pixels per terminal row / column.
const ROW_PX: f32 = 20.0;
const COL_PX: f32 = 10.0;
const FRAME: Duration = Duration::from_millis(16);

const SECTIONS: [(&str, &str, Direction, u64); 4] = [
    ("About", "Engineer who likes small, sharp tools.", Direction::Up, 0),
    ("Skills", "Rust, TypeScript, distributed systems, UI motion.", Direction::Left, 150),
    ("Projects", "folio-motion, a CMS-backed portfolio, assorted CLIs.", Direction::Right, 150),
    ("Contact", "Say hello. The form is out of scope here.", Direction::Fade, 0),
];

struct Section {
    title: &'static str,
    body: &'static str,
    element: ElementId,
    handle: RevealHandle,
    revealed_at: Option<Instant>,
}

struct Page {
    viewport: Viewport,
    timers: TimerQueue,
    hero: HeroContent,
    hero_element: ElementId,
    typing: TypewriterHandle,
    sections: Vec<Section>,
}

fn init_logging() -> io::Result<()> {
    let file = std::fs::File::create(std::env::temp_dir().join("folio-motion-demo.log"))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_hero() -> HeroContent {
    let remote = std::fs::read_to_string("hero.json")
        .map_err(MotionError::from)
        .and_then(|body| HeroOverrides::from_json(&body));
    resolve(remote, &HeroContent::default())
}

fn build_page(config: &MotionConfig, width: u16, height: u16) -> Page {
    let viewport = Viewport::new(width as f32 * COL_PX, height as f32 * ROW_PX);
    let timers = TimerQueue::new();

    let reveals = RevealController::new(Rc::new(viewport.clone()), Rc::new(timers.clone()))
        .with_root_margin(config.reveal.root_margin_px)
        .with_reduced_motion(config.reduced_motion);
    let typewriter = CyclingTypewriter::new(Rc::new(timers.clone()))
        .with_timing(config.typewriter_timing())
        .with_cursor(config.typewriter.cursor.clone());

    let page_width = width as f32 * COL_PX;
    let screen = height as f32 * ROW_PX;
    let hero = load_hero();
    let hero_element = viewport.insert_element(Rect::new(0.0, 0.0, page_width, screen));
    let typing = typewriter.start(hero.roles.clone());

    let section_height = screen * 0.8;
    let sections = SECTIONS
        .iter()
        .enumerate()
        .map(|(i, &(title, body, direction, delay_ms))| {
            let y = screen + i as f32 * section_height;
            let element = viewport.insert_element(Rect::new(0.0, y, page_width, section_height));
            let reveal = RevealConfig {
                direction,
                ..config.reveal_config()
            }
            .with_delay_ms(delay_ms);
            Section {
                title,
                body,
                element,
                handle: reveals.attach(element, reveal),
                revealed_at: None,
            }
        })
        .collect();

    Page {
        viewport,
        timers,
        hero,
        hero_element,
        typing,
        sections,
    }
}

fn screen_row(viewport: &Viewport, element: ElementId) -> Option<i32> {
    let rect = viewport.element_rect(element)?;
    let (_, scroll_y) = viewport.scroll_offset();
    Some(((rect.y - scroll_y) / ROW_PX).round() as i32)
}

fn put(out: &mut Stdout, col: i32, row: i32, rows: u16, text: &str) -> io::Result<()> {
    if row < 0 || row >= rows as i32 {
        return Ok(());
    }
    queue!(out, cursor::MoveTo(col.max(0) as u16, row as u16), Print(text))
}

fn draw(out: &mut Stdout, page: &mut Page, rows: u16) -> io::Result<()> {
    queue!(out, terminal::Clear(ClearType::All))?;

    if let Some(top) = screen_row(&page.viewport, page.hero_element) {
        let hero = &page.hero;
        put(out, 4, top + 2, rows, &hero.greeting)?;
        queue!(out, SetAttribute(Attribute::Bold))?;
        put(out, 4, top + 3, rows, &hero.name)?;
        queue!(out, SetAttribute(Attribute::Reset))?;
        let line = format!("{}{}", page.typing.displayed_text(), page.typing.cursor());
        put(out, 4, top + 5, rows, &line)?;
        put(out, 4, top + 7, rows, &hero.bio)?;
    }

    for section in &mut page.sections {
        let Some(top) = screen_row(&page.viewport, section.element) else {
            continue;
        };

        let target = section.handle.style();
        if target.opacity > 0.0 && section.revealed_at.is_none() {
            section.revealed_at = Some(Instant::now());
        }

        let hidden = RevealState::Pending.style(section.handle.config().direction, target.duration_secs);
        let (opacity, offset) = match section.revealed_at {
            Some(at) => Transition::between(hidden, target).sample(at.elapsed()),
            None => (hidden.opacity, hidden.offset),
        };
        if opacity < 0.05 {
            continue;
        }

        let col = 4 + (offset.dx / COL_PX).round() as i32;
        let row = top + 1 + (offset.dy / ROW_PX).round() as i32;
        if opacity < 0.6 {
            queue!(out, SetAttribute(Attribute::Dim))?;
        }
        queue!(out, SetAttribute(Attribute::Bold))?;
        put(out, col, row, rows, section.title)?;
        queue!(out, SetAttribute(Attribute::NormalIntensity))?;
        put(out, col, row + 2, rows, section.body)?;
        queue!(out, SetAttribute(Attribute::Reset))?;
    }

    out.flush()
}

fn run(out: &mut Stdout, config: &MotionConfig) -> io::Result<()> {
    let (width, height) = terminal::size()?;
    let mut page = build_page(config, width, height);
    let mut rows = height;
    let step = ROW_PX * 3.0;

    loop {
        page.timers.poll();
        page.viewport.flush();
        draw(out, &mut page, rows)?;

        let timeout = page.timers.time_until_next().unwrap_or(FRAME).min(FRAME);
        if !event::poll(timeout)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => {
                    page.viewport.scroll_by(0.0, step);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    page.viewport.scroll_by(0.0, -step);
                }
                KeyCode::PageDown | KeyCode::Char(' ') => {
                    let (_, h) = page.viewport.size();
                    page.viewport.scroll_by(0.0, h * 0.9);
                }
                KeyCode::PageUp => {
                    let (_, h) = page.viewport.size();
                    page.viewport.scroll_by(0.0, -h * 0.9);
                }
                KeyCode::Char('g') | KeyCode::Home => page.viewport.scroll_to_top(),
                KeyCode::Char('G') | KeyCode::End => page.viewport.scroll_to_bottom(),
                _ => {}
            },
            Event::Resize(w, h) => {
                rows = h;
                page.viewport.resize(w as f32 * COL_PX, h as f32 * ROW_PX);
            }
            _ => {}
        }
    }

    page.typing.stop();
    Ok(())
}

fn main() -> io::Result<()> {
    init_logging()?;

    let config = MotionConfig::load("motion.toml").unwrap_or_else(|err| {
        tracing::warn!(error = %err, "invalid motion.toml, using defaults");
        MotionConfig::default()
    });

    let mut out = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;

    let result = run(&mut out, &config);

    execute!(out, cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}
