use std::time::Duration;

use autoroute::{AccessLog, Router, Server};
use tokio::sync::oneshot;

#[tokio::test]
async fn stops_when_shutdown_future_resolves() {
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(
        Server::bind("127.0.0.1:0")
            .access_log(AccessLog::default())
            .serve_with_shutdown(Router::new(), async {
                let _ = stopped.await;
            }),
    );

    stop.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}

#[test]
#[should_panic(expected = "cannot bind")]
fn bind_rejects_bad_address() {
    let _ = Server::bind("not an address");
}
