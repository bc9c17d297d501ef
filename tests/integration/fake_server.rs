//! Minimal compile server for driving the binary end to end.
//!
//! Speaks just enough HTTP/1.1 for ureq: every response closes its
//! connection. The event stream waits until a build was triggered, then
//! pushes `running` and `success` for that build.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct State {
    next_build: u32,
    current: Option<String>,
    triggered: bool,
    requests: Vec<String>,
    uploads: Vec<String>,
}

type Shared = Arc<(Mutex<State>, Condvar)>;

pub struct FakeServer {
    pub url: String,
    shared: Shared,
}

impl FakeServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let shared: Shared = Arc::new((Mutex::new(State::default()), Condvar::new()));

        let accept = shared.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let shared = accept.clone();
                thread::spawn(move || handle(stream, &shared));
            }
        });

        Self { url, shared }
    }

    /// `METHOD /path` of every request so far
    pub fn requests(&self) -> Vec<String> {
        self.shared.0.lock().unwrap().requests.clone()
    }

    /// Raw multipart bodies received
    pub fn uploads(&self) -> Vec<String> {
        self.shared.0.lock().unwrap().uploads.clone()
    }
}

fn handle(mut stream: TcpStream, shared: &Shared) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();
    let path = target.split('?').next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }
    let body = String::from_utf8_lossy(&body).into_owned();

    let (lock, triggered) = &**shared;
    lock.lock().unwrap().requests.push(format!("{} {}", method, path));

    match (method.as_str(), path.as_str()) {
        ("POST", p) if p.ends_with("/builds/init") => {
            let id = next_build(&mut lock.lock().unwrap());
            respond(
                &mut stream,
                "200 OK",
                &format!(r#"{{"buildId":"{}","existingFiles":{{}}}}"#, id),
            );
        }
        ("POST", p) if p.starts_with("/builds/") && p.ends_with("/files") => {
            {
                let mut state = lock.lock().unwrap();
                state.uploads.push(body);
                state.triggered = true;
            }
            triggered.notify_all();
            respond(&mut stream, "200 OK", "{}");
        }
        ("POST", p) if p.starts_with("/projects/") && p.ends_with("/builds") => {
            let id = {
                let mut state = lock.lock().unwrap();
                state.triggered = true;
                next_build(&mut state)
            };
            triggered.notify_all();
            respond(&mut stream, "200 OK", &format!(r#"{{"buildId":"{}"}}"#, id));
        }
        ("GET", p) if p.ends_with("/events") => {
            let state = lock.lock().unwrap();
            let (mut state, timeout) = triggered
                .wait_timeout_while(state, Duration::from_secs(20), |s| !s.triggered)
                .unwrap();
            if timeout.timed_out() {
                return;
            }
            state.triggered = false;
            let id = state.current.clone().unwrap_or_default();
            drop(state);

            let _ = write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n"
            );
            let _ = write!(stream, ": connected\n\n");
            let _ = write!(
                stream,
                "data: {{\"id\":\"{}\",\"state\":\"running\",\"message\":\"Running pdflatex\"}}\n\n",
                id
            );
            let _ = write!(
                stream,
                "data: {{\"id\":\"{}\",\"state\":\"success\",\"message\":\"Output written\"}}\n\n",
                id
            );
            let _ = stream.flush();
        }
        ("GET", p) if p.ends_with("/synctex/view") => respond(
            &mut stream,
            "200 OK",
            r#"{"page":2,"x":72.5,"y":144.0,"file":"main.tex","line":3}"#,
        ),
        _ => respond(&mut stream, "404 Not Found", ""),
    }
}

fn next_build(state: &mut State) -> String {
    state.next_build += 1;
    let id = format!("b{}", state.next_build);
    state.current = Some(id.clone());
    id
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let _ = write!(
        stream,
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.flush();
}
