// main.rs - Desktop viewer painting every frame the scheduler presents

use std::time::Duration;

use clap::Parser;
use conway::{CpuBackend, Frame, LifeArgs, LifeConfig, TickerHandle, cpu_scheduler, ticker};
use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};
use tokio::sync::watch;
use tracing::{error, info, warn};

type ViewerBackend = CpuBackend<watch::Sender<Option<Frame>>>;

#[derive(Parser)]
#[command(name = "grid_display", about = "Watch the double-buffered Game of Life in a window")]
struct Cli {
    #[command(flatten)]
    life: LifeArgs,
}

fn main() -> Result<(), eframe::Error> {
    init_tracing();
    let cli = Cli::parse();

    let viewer = match cli.life.resolve().and_then(GridViewer::start) {
        Ok(viewer) => viewer,
        Err(err) => {
            error!(%err, "cannot start simulation");
            std::process::exit(2);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Game of Life",
        options,
        Box::new(|_cc| Box::new(viewer)),
    )
}

struct GridViewer {
    runtime: tokio::runtime::Runtime,
    ticker: Option<TickerHandle<ViewerBackend>>,
    frames: watch::Receiver<Option<Frame>>,
    interval: Duration,
    canvas_color: Color32,
    live_color: Color32,
    dead_color: Color32,
}

impl GridViewer {
    /// Seeds the grid and starts ticking on a background runtime.
    fn start(config: LifeConfig) -> conway::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("grid-display-ticker")
            .enable_time()
            .build()?;

        let (tx, frames) = watch::channel(None);
        let scheduler = cpu_scheduler(&config, tx)?;
        let ticker = {
            let _guard = runtime.enter();
            ticker::spawn(scheduler, config.interval(), None)
        };
        info!(width = config.width, height = config.height, "viewer started");

        Ok(Self {
            runtime,
            ticker: Some(ticker),
            frames,
            interval: config.interval(),
            canvas_color: Color32::from_rgb(26, 77, 102),
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
        })
    }

    fn draw_grid(&self, ui: &mut egui::Ui, frame: &Frame) {
        let (width, height) = (frame.size.width(), frame.size.height());
        let spacing = 0.5;
        let available = ui.available_size();
        let box_size = ((available.x / width as f32).min(available.y / height as f32) - spacing)
            .clamp(1.0, 24.0);

        let start_pos = ui.cursor().min;
        let total_size = Vec2::new(
            (box_size + spacing) * width as f32 - spacing,
            (box_size + spacing) * height as f32 - spacing,
        );
        let (_response, painter) = ui.allocate_painter(total_size, egui::Sense::hover());

        painter.rect_filled(Rect::from_min_size(start_pos, total_size), 0.0, self.canvas_color);

        for y in 0..height {
            for x in 0..width {
                let rect = Rect::from_min_size(
                    egui::pos2(
                        start_pos.x + x as f32 * (box_size + spacing),
                        start_pos.y + y as f32 * (box_size + spacing),
                    ),
                    Vec2::splat(box_size),
                );
                let color = if frame.is_alive(x, y) { self.live_color } else { self.dead_color };
                painter.rect_filled(rect, 1.0, color);
                painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));
            }
        }
    }
}

impl eframe::App for GridViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let latest = self.frames.borrow_and_update().clone();
        let stopped = self.ticker.as_ref().is_none_or(|t| t.is_finished());

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Game of Life");

            ui.horizontal(|ui| match &latest {
                Some(frame) => {
                    ui.label(format!("Generation: {}", frame.sequence + 1));
                    ui.separator();
                    ui.label(format!("Live cells: {}", frame.population()));
                }
                None => {
                    ui.label("Waiting for the first generation...");
                }
            });
            if stopped {
                ui.colored_label(Color32::RED, "Simulation stopped, see log for details.");
            }

            ui.separator();

            if let Some(frame) = &latest {
                self.draw_grid(ui, frame);
            }
        });

        ctx.request_repaint_after(self.interval);
    }
}

impl Drop for GridViewer {
    fn drop(&mut self) {
        let Some(ticker) = self.ticker.take() else { return };
        match self.runtime.block_on(ticker.stop()) {
            Ok(scheduler) => info!(generations = scheduler.step(), "viewer closed"),
            Err(err) => warn!(%err, "simulation ended with an error"),
        }
    }
}

fn init_tracing() {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::new("warn,conway=info,grid_display=info"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
