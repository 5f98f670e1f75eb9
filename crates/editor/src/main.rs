use std::env;
use std::error::Error;

use engine_core::input::InputDefaults;
use engine_core::{Engine, EngineConfig, InputPoller};
use engine_shared::input_types::InputEventKind;
use tracing::{debug, info, warn};
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = match args.get(1) {
        Some(path) => EngineConfig::load(path)?,
        None => {
            info!("no config given, using defaults");
            EngineConfig::default()
        }
    };
    config.input = InputDefaults::or_default(&config.input);

    let mut engine = Engine::init(config)?;
    let input_events = engine.input_mut().subscribe();
    let resource_events = engine.resources_mut().subscribe();

    // Taken out on exit so that modules shut down in order.
    let mut engine = Some(engine);
    let mut poller = InputPoller::new();

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Input & Resource Inspector")
        .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0))
        .build(&event_loop)?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                other => poller.handle_event(&other),
            },

            Event::AboutToWait => {
                if let Some(engine) = engine.as_mut() {
                    engine.update(poller.snapshot());
                    poller.end_frame();
                }

                for event in input_events.try_iter() {
                    match event.kind {
                        InputEventKind::SelectSet => {
                            info!(set = %event.payload.set_name, "input set selected")
                        }
                        kind => info!(
                            set = %event.payload.set_name,
                            input = %event.payload.input_name,
                            ?kind,
                            "input"
                        ),
                    }
                }

                for event in resource_events.try_iter() {
                    info!(kind = ?event.kind(), group = event.group(), "resource");
                    debug!(?event);
                }

                window.request_redraw();
            }

            Event::LoopExiting => match engine.take() {
                Some(engine) => engine.exit(),
                None => warn!("engine already shut down"),
            },

            _ => {}
        }
    })?;

    Ok(())
}
