use quadlife::WorldOffset;
use quadlife::pattern::Pattern;
use quadlife::world::World;

const MAX_PERIOD: u64 = 16;

/// Period and displacement `(dx, dy)` over one period of every pattern in `tests/patterns`
fn expected(name: &str) -> Option<(u64, WorldOffset, WorldOffset)> {
    match name {
        "beacon" => Some((2, 0, 0)),
        "blinker" => Some((2, 0, 0)),
        "block" => Some((1, 0, 0)),
        "glider" => Some((4, 1, 1)),
        "lwss" => Some((4, -2, 0)),
        "pulsar" => Some((3, 0, 0)),
        "toad" => Some((2, 0, 0)),
        _ => None,
    }
}

/// Step until the pattern comes back, up to some translation
fn find_period(pattern: &Pattern) -> anyhow::Result<Option<(u64, WorldOffset, WorldOffset)>> {
    let mut world = World::from_pattern(pattern)?;

    let start = world.snapshot();
    let Some((x0, y0, _, _)) = world.bounding_box() else {
        anyhow::bail!("pattern is empty");
    };

    for generation in 1..=MAX_PERIOD {
        world.next_gen()?;

        if world.snapshot() == start
            && let Some((x, y, _, _)) = world.bounding_box()
        {
            return Ok(Some((generation, x - x0, y - y0)));
        }
    }

    Ok(None)
}

#[test]
fn test_patterns() -> anyhow::Result<()> {
    let pattern_dir = std::fs::read_dir("tests/patterns")?;
    let mut tested = 0;
    let mut failed = Vec::new();

    for entry in pattern_dir {
        let path = entry?.path();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let text = std::fs::read_to_string(&path)?;
        let pattern = match Pattern::parse_plaintext(&text) {
            Ok(p) => p,
            Err(e) => {
                failed.push((path.clone(), format!("{e}")));
                continue;
            }
        };

        let found = match find_period(&pattern) {
            Ok(found) => found,
            Err(e) => {
                failed.push((path.clone(), format!("{e:#}")));
                continue;
            }
        };

        if found == expected(&name) {
            tested += 1;
        } else {
            failed.push((
                path.clone(),
                format!("expected {:?}, found {found:?}", expected(&name)),
            ));
        }
    }

    if !failed.is_empty() {
        for (path, err) in &failed {
            eprintln!("Failed on {:?}: {}", path, err);
        }

        panic!(
            "{}/{} patterns failed",
            failed.len(),
            tested + failed.len()
        );
    }

    println!("Successfully ran {} patterns", tested);

    Ok(())
}

#[test]
fn pattern_names_are_kept() -> anyhow::Result<()> {
    let text = std::fs::read_to_string("tests/patterns/glider.cells")?;
    let pattern = Pattern::parse_plaintext(&text)?;

    assert_eq!(pattern.name.as_deref(), Some("Glider"));
    assert_eq!(pattern.population(), 5);

    Ok(())
}
