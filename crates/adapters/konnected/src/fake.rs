//! Loopback stand-in for a Konnected board.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::protocol::{Command, PinState};

#[derive(Clone, Default)]
struct Board {
    pins: Arc<Mutex<Vec<PinState>>>,
    commands: Arc<Mutex<Vec<Command>>>,
}

pub(crate) struct FakeBoard {
    addr: SocketAddr,
    board: Board,
}

impl FakeBoard {
    pub async fn spawn(pins: &[(u8, u8)]) -> Self {
        let board = Board::default();
        *board.pins.lock().unwrap() = pins.iter().map(|&(pin, state)| PinState { pin, state }).collect();

        let app = Router::new()
            .route("/status", get(status))
            .route("/device", get(device).put(actuate))
            .with_state(board.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, board }
    }

    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    pub fn set_pin(&self, pin: u8, state: u8) {
        let mut pins = self.board.pins.lock().unwrap();
        match pins.iter_mut().find(|p| p.pin == pin) {
            Some(existing) => existing.state = state,
            None => pins.push(PinState { pin, state }),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.board.commands.lock().unwrap().clone()
    }
}

async fn status(State(board): State<Board>) -> Json<Value> {
    let sensors = board.pins.lock().unwrap().clone();
    Json(json!({
        "mac": "84:f3:eb:12:34:56",
        "hwVersion": "2.3.0",
        "swVersion": "2.3.4",
        "rssi": -58,
        "sensors": sensors,
    }))
}

async fn device(State(board): State<Board>) -> Json<Vec<PinState>> {
    Json(board.pins.lock().unwrap().clone())
}

async fn actuate(State(board): State<Board>, Json(command): Json<Command>) -> Json<Value> {
    board.commands.lock().unwrap().push(command);
    Json(json!({ "pin": command.pin, "state": command.state }))
}
