use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use cookie_keeper::config::CookieConfig;
use cookie_keeper::cookies::{CookieStore, CookieStoreHandle};
use cookie_keeper::net::{fetch, FetchRequest, RequestCookieOptions};
use cookie_keeper::storage::InMemoryKeyValueStore;
use http::header::REFERER;
use http::HeaderMap;

/// Serves one canned response per accepted connection and reports the
/// request head it received.
fn serve(responses: Vec<&'static str>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for response in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            tx.send(head.to_ascii_lowercase()).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    (format!("http://{}", addr), rx)
}

fn store() -> CookieStoreHandle {
    CookieStore::open(Arc::new(InMemoryKeyValueStore::new()), &CookieConfig::default())
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

#[tokio::test]
async fn response_cookies_are_sent_on_the_next_request() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (base, requests) = serve(vec![
        "HTTP/1.1 200 OK\r\nSet-Cookie: sid=abc; Path=/\r\nSet-Cookie: XSRF-TOKEN=t1; Path=/\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        "HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n",
    ]);
    let store = store();
    let client = client();

    let res = fetch(&client, &store, FetchRequest::get(format!("{base}/login"))).await.unwrap();
    assert!(res.is_success());
    assert_eq!(res.text(), "ok");
    let first = requests.recv().unwrap();
    assert!(!first.contains("cookie:"));

    let mut headers = HeaderMap::new();
    headers.insert(REFERER, "http://elsewhere.test/".parse().unwrap());
    let request = FetchRequest::post(format!("{base}/api/items"), "x=1")
        .headers(headers)
        .cookies(RequestCookieOptions::xsrf("XSRF-TOKEN", "X-XSRF-TOKEN"));
    let res = fetch(&client, &store, request).await.unwrap();
    assert_eq!(res.status, 204);

    let second = requests.recv().unwrap();
    assert!(second.contains("cookie: sid=abc; xsrf-token=t1"), "{second}");
    assert!(second.contains("x-xsrf-token: t1"), "{second}");
    assert!(!second.contains("referer:"), "{second}");
}

#[tokio::test]
async fn timeout_is_reported_with_its_duration() {
    // Accepts the connection but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || listener.accept().map(|(stream, _)| stream));

    let request = FetchRequest::get(format!("http://{addr}/slow"))
        .timeout(std::time::Duration::from_millis(200));
    let err = fetch(&client(), &store(), request).await.unwrap_err();
    assert_eq!(err.to_string(), "timeout of 200ms exceeded");

    drop(handle.join());
}
