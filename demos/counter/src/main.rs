#![allow(non_snake_case)]
use std::io::{self, BufRead, Write};

use tally_core::prelude::*;
use tally_devtools::Inspector;

/// One counter. `name` keeps button labels unique when several are mounted.
fn Counter(name: &'static str) -> View {
    let count = remember_cell_with_key(format!("counter:{name}"), || 0i32).label(name);

    // derived on every render, never stored
    let parity = if count.read() % 2 == 0 { "even" } else { "odd" };

    Column(vec![
        Text(format!("{name}: {} ({parity})", count.read())),
        Button(format!("{name} +1"), {
            let count = count.clone();
            move || count.update(|n| n + 1)
        }),
        Button(format!("{name} -1"), {
            let count = count.clone();
            move || count.update(|n| n - 1)
        }),
        // every request is built from the same stale read, so they collapse to +1
        Button(format!("{name} +3 stale"), {
            let count = count.clone();
            move || {
                let n = count.read();
                count.set(n + 1);
                count.set(n + 1);
                count.set(n + 1);
            }
        }),
        Button(format!("{name} +3"), {
            let count = count.clone();
            move || {
                count.update(|n| n + 1);
                count.update(|n| n + 1);
                count.update(|n| n + 1);
            }
        }),
        Button(format!("{name} reset"), move || count.set(0)),
    ])
}

fn App() -> View {
    let mounted = remember(|| std::cell::Cell::new(false));
    if !mounted.replace(true) {
        scoped_effect(|| {
            log::info!("Mounted App");
            on_dispose(|| log::info!("Unmounted App"))
        });
    }

    Column(vec![
        Text("Tally counters"),
        Counter("left"),
        Counter("right"),
    ])
}

fn print_frame(out: &mut impl Write, host: &Host, inspector: &Inspector) -> io::Result<()> {
    write!(out, "{}", host.view().render_text())?;
    writeln!(out, "-- {}", inspector.hud_line())?;
    out.flush()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut inspector = Inspector::new();
    inspector.install();

    let mut host = Host::new(App);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "Type a button label (e.g. `left +3 stale`), or `quit`.")?;
    print_frame(&mut out, &host, &inspector)?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        let label = line.trim();
        if label.is_empty() {
            continue;
        }
        if label == "quit" {
            break;
        }
        match inspector.time_turn(|| host.click(label)) {
            Ok(report) => log::debug!("{label}: {report:?}"),
            Err(StateError::NoSuchTarget(label)) => {
                writeln!(out, "no button `{label}`")?;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
        print_frame(&mut out, &host, &inspector)?;
    }

    host.dispose();
    Ok(())
}
