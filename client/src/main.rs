use clap::Parser;
use client::game::{MatchState, TickClock};
use client::input::{InputManager, UiAction};
use client::network::{NetworkClient, NetworkEvent};
use client::rendering::Renderer;
use log::{info, warn};
use macroquad::miniquad::window::clipboard_set;
use macroquad::prelude::*;
use shared::{ClientMessage, ServerMessage};

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-player air hockey", long_about = None)]
struct Args {
    /// Relay WebSocket URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080/")]
    server: String,

    /// Create a match as soon as the window opens
    #[arg(long, conflicts_with = "join")]
    create: bool,

    /// Join the match with this share code as soon as the window opens
    #[arg(short = 'j', long)]
    join: Option<String>,
}

fn window_conf() -> Conf {
    let (width, height) = Renderer::window_size();
    Conf {
        window_title: "Air Hockey".to_owned(),
        window_width: width,
        window_height: height,
        window_resizable: false,
        ..Default::default()
    }
}

fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Relay: {}", args.server);
    info!("Controls: move the mouse, Tab to create a match, type a code + Enter to join");
    info!("Ctrl+C copies the share code");

    macroquad::Window::from_config(window_conf(), run(args));
}

async fn run(args: Args) {
    let mut game = MatchState::new();
    let mut input = InputManager::new();
    let renderer = Renderer::new();
    let mut clock = TickClock::new();
    let mut network: Option<NetworkClient> = None;

    let mut startup_action = if args.create {
        Some(UiAction::Create)
    } else {
        args.join.as_deref().map(|code| {
            input.code_entry_mut().set(code);
            UiAction::Join(input.code_entry().as_str().to_string())
        })
    };

    loop {
        if let Some(link) = network.as_mut() {
            for event in link.poll() {
                match event {
                    NetworkEvent::Connected => game.on_connected(),
                    NetworkEvent::Message(msg) => {
                        if let ServerMessage::Created { code } = &msg {
                            input.code_entry_mut().set(code);
                        }
                        game.handle_server_message(msg);
                    }
                    NetworkEvent::Disconnected(reason) => {
                        if let Some(reason) = reason {
                            warn!("Connection lost: {}", reason);
                        }
                        game.on_disconnected();
                    }
                }
            }
        }

        let frame = input.update(renderer.table_origin());
        if frame.quit {
            break;
        }
        if let Some((x, y)) = frame.pointer {
            game.set_pointer(x, y);
        }

        match frame.action.or_else(|| startup_action.take()) {
            Some(UiAction::CopyCode) => {
                if let Some(code) = game.copy_code(input.code_entry().as_str()) {
                    clipboard_set(&code);
                }
            }
            Some(UiAction::Create) => {
                if let Some(link) = NetworkClient::ensure(&mut network, &args.server) {
                    link.send(&ClientMessage::Create);
                }
            }
            Some(UiAction::Join(code)) => {
                if let Some(link) = NetworkClient::ensure(&mut network, &args.server) {
                    game.request_join(&code);
                    link.send(&ClientMessage::Join { code });
                }
            }
            None => {}
        }

        for _ in 0..clock.advance(get_frame_time()) {
            let score = game.step();

            if let Some(link) = network.as_ref() {
                if game.should_broadcast() {
                    if let Some(score) = score {
                        link.send(&score);
                    }
                    link.send(&ClientMessage::Move(game.outgoing_move()));
                }
            }
        }

        renderer.render(&game, input.code_entry());
        next_frame().await;
    }
}
