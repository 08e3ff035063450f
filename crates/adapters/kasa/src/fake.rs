//! Loopback Kasa device speaking the framed TCP protocol.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::cipher;
use crate::protocol::{ChildInfo, SysInfo};

#[derive(Clone)]
pub(crate) struct FakeKasa {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<SysInfo>>,
    pub commands: Arc<Mutex<Vec<Value>>>,
    pub reject: Arc<AtomicBool>,
}

impl FakeKasa {
    pub fn plug(model: &str, on: bool) -> SysInfo {
        SysInfo {
            sw_ver: "1.5.6".to_string(),
            hw_ver: "2.0".to_string(),
            model: model.to_string(),
            device_id: "8006A1B2C3D4E5F60718".to_string(),
            alias: "Porch".to_string(),
            mac: "50:C7:BF:00:11:22".to_string(),
            relay_state: u8::from(on),
            ..SysInfo::default()
        }
    }

    pub fn dimmer(on: bool, brightness: u8) -> SysInfo {
        SysInfo {
            alias: "Hall Dimmer".to_string(),
            brightness,
            ..Self::plug("HS220(US)", on)
        }
    }

    pub fn strip(children: &[(&str, bool)]) -> SysInfo {
        SysInfo {
            alias: "Desk Strip".to_string(),
            children: children
                .iter()
                .map(|(id, on)| ChildInfo {
                    id: (*id).to_string(),
                    state: u8::from(*on),
                    alias: format!("Outlet {id}"),
                    on_time: 0,
                })
                .collect(),
            ..Self::plug("KP303(US)", false)
        }
    }

    pub async fn spawn(info: SysInfo) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let fake = Self {
            addr: listener.local_addr().unwrap(),
            state: Arc::new(Mutex::new(info)),
            commands: Arc::default(),
            reject: Arc::default(),
        };
        let server = fake.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let server = server.clone();
                tokio::spawn(async move { server.serve(stream).await });
            }
        });
        fake
    }

    pub fn set_relay(&self, on: bool) {
        self.state.lock().unwrap().relay_state = u8::from(on);
    }

    pub fn set_child(&self, id: &str, on: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(child) = state.children.iter_mut().find(|c| c.id == id) {
            child.state = u8::from(on);
        }
    }

    /// Commands received so far, excluding sysinfo reads.
    pub fn writes(&self) -> Vec<Value> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c["system"].get("get_sysinfo").is_none())
            .cloned()
            .collect()
    }

    async fn serve(&self, mut stream: TcpStream) {
        let mut header = [0_u8; cipher::HEADER_LEN];
        if stream.read_exact(&mut header).await.is_err() {
            return;
        }
        let mut body = vec![0_u8; cipher::frame_len(header)];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        let command: Value = serde_json::from_slice(&cipher::decrypt(&body)).unwrap_or(Value::Null);
        self.commands.lock().unwrap().push(command.clone());
        let reply = self.respond(&command).to_string();
        let _ = stream.write_all(&cipher::frame(reply.as_bytes())).await;
    }

    fn respond(&self, command: &Value) -> Value {
        let rejected = self.reject.load(Ordering::SeqCst);
        let code = if rejected { -1 } else { 0 };
        let child = command["context"]["child_ids"][0].as_str().map(str::to_string);

        if command["system"].get("get_sysinfo").is_some() {
            let info = serde_json::to_value(&*self.state.lock().unwrap()).unwrap();
            return json!({ "system": { "get_sysinfo": info } });
        }
        if let Some(args) = command["system"].get("set_relay_state") {
            if !rejected {
                let on = args["state"].as_u64() == Some(1);
                match child {
                    Some(id) => self.set_child(&id, on),
                    None => self.set_relay(on),
                }
            }
            return json!({ "system": { "set_relay_state": { "err_code": code } } });
        }
        if let Some(args) = command["smartlife.iot.dimmer"].get("set_brightness") {
            if !rejected {
                let level = args["brightness"].as_u64().unwrap_or_default();
                self.state.lock().unwrap().brightness = u8::try_from(level).unwrap();
            }
            return json!({ "smartlife.iot.dimmer": { "set_brightness": { "err_code": code } } });
        }
        if let Some(countdown) = command.get("count_down").and_then(Value::as_object) {
            let mut section = serde_json::Map::new();
            for method in countdown.keys() {
                section.insert(method.clone(), json!({ "err_code": code }));
            }
            return json!({ "count_down": section });
        }
        json!({ "err_code": -1, "err_msg": "module not support" })
    }
}
