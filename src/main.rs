use std::fs;
use std::io;
use std::io::Write;
use std::time::Duration;
use std::time::Instant;

use anyhow::Context;
use crossterm::cursor;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::style;
use crossterm::terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quadlife::config::Command;
use quadlife::config::Config;
use quadlife::config::USAGE;
use quadlife::pattern::Pattern;
use quadlife::render;
use quadlife::world::World;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help) => {
            print!("{USAGE}");
            return Ok(());
        }
        Err(e) => {
            eprint!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };

    let text = fs::read_to_string(&config.path)
        .with_context(|| format!("Failed to read {}", config.path.display()))?;
    let pattern = Pattern::parse_plaintext(&text)
        .with_context(|| format!("Failed to parse {}", config.path.display()))?;

    info!(
        name = pattern.name.as_deref().unwrap_or("<unnamed>"),
        population = pattern.population(),
        "Loaded pattern"
    );

    let mut world = World::from_pattern_with_config(&pattern, config.world())?;

    if config.animate {
        animate(&mut world, &config)?;
    } else {
        let t = Instant::now();
        world.step(config.generations)?;

        info!(
            generations = config.generations,
            elapsed = ?t.elapsed(),
            nodes = world.store().len(),
            "Done"
        );

        let mut snapshot = world.snapshot();
        snapshot.name = pattern.name;

        let mut stdout = io::stdout();
        writeln!(stdout, "!Generation: {}", world.generation())?;
        write!(stdout, "{}", draw(&snapshot, config.braille))?;
    }

    Ok(())
}

fn draw(pattern: &Pattern, braille: bool) -> String {
    if braille {
        render::to_braille(pattern)
    } else {
        pattern.to_plaintext()
    }
}

/// Returns true if the user asked to quit
fn quit_requested(event: Event) -> bool {
    matches!(
        event,
        Event::Key(
            KeyEvent {
                code: KeyCode::Char('q'),
                ..
            } | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        )
    )
}

fn animate(world: &mut World, config: &Config) -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;

    let res = run_animation(world, config);

    terminal::disable_raw_mode()?;

    res
}

fn run_animation(world: &mut World, config: &Config) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    let frametime = Duration::from_secs_f64(1f64 / config.fps as f64);

    loop {
        let t = Instant::now();

        let frame = draw(&world.snapshot(), config.braille);

        execute!(
            stdout,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
        )?;

        for line in frame.lines() {
            execute!(stdout, style::Print(line), cursor::MoveToNextLine(1))?;
        }

        let status = format!(
            "generation {} | population {} | level {} | {} nodes",
            world.generation(),
            world.population(),
            world.level(),
            world.store().len()
        );
        execute!(stdout, style::Print(status), cursor::MoveToNextLine(1))?;

        if config.generations > 0 && world.generation() >= config.generations {
            break;
        }

        // Poll events for whatever is left of the frame
        let time_left = frametime.saturating_sub(t.elapsed());
        if event::poll(time_left)? && quit_requested(event::read()?) {
            break;
        }

        world.next_gen()?;
    }

    Ok(())
}
