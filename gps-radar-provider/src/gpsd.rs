use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use gps_radar_logic::{
    LocationProvider, LocationRequest, LocationSample, Priority, prelude::Result,
};
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::Mutex as AsyncMutex,
};
use tokio_util::sync::CancellationToken;

/// Where gpsd listens by default
pub const DEFAULT_GPSD_ADDR: &str = "127.0.0.1:2947";

const WATCH_ENABLE: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";
const WATCH_DISABLE: &[u8] = b"?WATCH={\"enable\":false};\n";

/// gpsd's NMEA mode, 2 = 2D fix, 3 = 3D fix
type FixMode = u8;
const MODE_2D: FixMode = 2;
const MODE_3D: FixMode = 3;

#[derive(Debug, Deserialize)]
struct TpvReport {
    #[serde(default)]
    mode: FixMode,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Estimated horizontal position error, newer gpsd only
    eph: Option<f32>,
    epx: Option<f32>,
    epy: Option<f32>,
    speed: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
enum Report {
    #[serde(rename = "TPV")]
    Tpv(TpvReport),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy)]
struct Fix {
    sample: LocationSample,
    mode: FixMode,
}

impl Fix {
    fn satisfies(&self, priority: Priority) -> bool {
        match priority {
            Priority::HighAccuracy => self.mode >= MODE_3D,
            Priority::Balanced => self.mode >= MODE_2D,
        }
    }
}

/// Parse one line of gpsd output, `None` for reports that aren't a usable position
fn parse_fix(line: &str) -> Result<Option<Fix>> {
    let report = serde_json::from_str::<Report>(line).context("Malformed gpsd report")?;

    let Report::Tpv(tpv) = report else {
        return Ok(None);
    };

    let (Some(lat), Some(lon)) = (tpv.lat, tpv.lon) else {
        return Ok(None);
    };

    if tpv.mode < MODE_2D {
        return Ok(None);
    }

    let accuracy = tpv
        .eph
        .or_else(|| match (tpv.epx, tpv.epy) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (x, y) => x.or(y),
        })
        .unwrap_or_default();

    Ok(Some(Fix {
        sample: LocationSample::new(lat, lon, accuracy, tpv.speed),
        mode: tpv.mode,
    }))
}

type LatestFix = Arc<Mutex<Option<Fix>>>;

fn set_latest(latest: &LatestFix, fix: Option<Fix>) {
    *latest.lock().unwrap_or_else(PoisonError::into_inner) = fix;
}

/// Write half of a live gpsd connection. `closed` is cancelled by the reader when gpsd goes away.
struct Connection {
    writer: OwnedWriteHalf,
    closed: CancellationToken,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

/// [LocationProvider] backed by a gpsd daemon. The connection is opened when location updates
/// are first activated and reopened on a later activation if gpsd went away. Reports are
/// streamed in the background, [LocationProvider::last_fix] hands out the newest position.
pub struct GpsdProvider {
    addr: String,
    conn: AsyncMutex<Option<Connection>>,
    latest: LatestFix,
    cancel: CancellationToken,
}

impl GpsdProvider {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            conn: AsyncMutex::new(None),
            latest: Arc::new(Mutex::new(None)),
            cancel: CancellationToken::new(),
        }
    }

    async fn connect(&self) -> Result<Connection> {
        let stream = TcpStream::connect(self.addr.as_str())
            .await
            .with_context(|| format!("Failed to connect to gpsd at {}", self.addr))?;

        let (reader, writer) = stream.into_split();
        let closed = self.cancel.child_token();

        tokio::spawn({
            let latest = self.latest.clone();
            let closed = closed.clone();
            async move {
                Self::read_loop(reader, latest, &closed).await;
                closed.cancel();
            }
        });

        info!("Connected to gpsd at {}", self.addr);

        Ok(Connection { writer, closed })
    }

    async fn read_loop(reader: OwnedReadHalf, latest: LatestFix, cancel: &CancellationToken) {
        let mut lines = BufReader::new(reader).lines();

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    break;
                }

                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => match parse_fix(&line) {
                            Ok(Some(fix)) => set_latest(&latest, Some(fix)),
                            Ok(None) => {}
                            Err(why) => debug!("Skipping gpsd line: {why:?}"),
                        },
                        Ok(None) => {
                            warn!("gpsd closed the connection");
                            break;
                        }
                        Err(why) => {
                            warn!("Lost connection to gpsd: {why:?}");
                            break;
                        }
                    }
                }
            }
        }

        set_latest(&latest, None);
    }

    async fn send_command(&self, command: &[u8], reconnect: bool) -> Result {
        let mut conn = self.conn.lock().await;

        if conn.as_ref().is_some_and(|c| c.closed.is_cancelled()) {
            *conn = None;
        }

        if conn.is_none() {
            if !reconnect {
                return Ok(());
            }
            *conn = Some(self.connect().await?);
        }

        let Some(Connection { writer, .. }) = conn.as_mut() else {
            return Ok(());
        };

        let res = async {
            writer.write_all(command).await?;
            writer.flush().await
        }
        .await;

        if let Err(why) = res {
            *conn = None;
            return Err(why).context("Failed to write to gpsd");
        }

        Ok(())
    }

}

impl Drop for GpsdProvider {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl LocationProvider for GpsdProvider {
    async fn activate(&self, _request: &LocationRequest) -> Result {
        self.send_command(WATCH_ENABLE, true)
            .await
            .context("Failed to enable gpsd watch")
    }

    fn last_fix(&self, priority: Priority) -> Option<LocationSample> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .filter(|fix| fix.satisfies(priority))
            .map(|fix| fix.sample)
    }

    async fn deactivate(&self) {
        if let Err(why) = self.send_command(WATCH_DISABLE, false).await {
            warn!("Failed to disable gpsd watch: {why:?}");
        }
        // Drop the last position so a later subscription doesn't start on a stale fix
        set_latest(&self.latest, None);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    const TPV_3D: &str = r#"{"class":"TPV","device":"/dev/ttyACM0","mode":3,"lat":37.422,"lon":-122.084,"eph":4.5,"speed":10.0}"#;
    const TPV_2D: &str = r#"{"class":"TPV","mode":2,"lat":51.5,"lon":-0.12,"epx":3.0,"epy":7.5}"#;

    #[test]
    fn test_parse_3d_fix() {
        let fix = parse_fix(TPV_3D).unwrap().expect("No fix parsed");
        assert_eq!(fix.mode, 3);
        assert_eq!(fix.sample.latitude, 37.422);
        assert_eq!(fix.sample.longitude, -122.084);
        assert_eq!(fix.sample.accuracy, 4.5);
        assert_eq!(fix.sample.speed, Some(10.0));
    }

    #[test]
    fn test_parse_2d_fix_uses_worst_axis() {
        let fix = parse_fix(TPV_2D).unwrap().expect("No fix parsed");
        assert_eq!(fix.sample.accuracy, 7.5);
        assert_eq!(fix.sample.speed, None);
        assert!(fix.satisfies(Priority::Balanced));
        assert!(!fix.satisfies(Priority::HighAccuracy));
    }

    #[test]
    fn test_parse_ignores_non_fixes() {
        let no_fix = r#"{"class":"TPV","mode":1}"#;
        let sky = r#"{"class":"SKY","satellites":[]}"#;
        let version = r#"{"class":"VERSION","release":"3.25"}"#;

        for line in [no_fix, sky, version] {
            assert!(parse_fix(line).unwrap().is_none(), "Parsed a fix from {line}");
        }

        assert!(parse_fix("not json").is_err());
    }

    async fn read_command(stream: &mut TcpStream) -> String {
        let mut buf = vec![0; 128];
        let n = stream.read(&mut buf).await.expect("Failed to read command");
        String::from_utf8_lossy(&buf[..n]).into_owned()
    }

    async fn wait_for_fix(provider: &GpsdProvider, priority: Priority) -> Option<LocationSample> {
        for _ in 0..200 {
            if let Some(fix) = provider.last_fix(priority) {
                return Some(fix);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    async fn serve() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    #[tokio::test]
    async fn test_no_connection_until_activated() {
        let (listener, addr) = serve().await;
        let provider = GpsdProvider::new(addr);

        let accepted = tokio::time::timeout(Duration::from_millis(50), listener.accept()).await;
        assert!(accepted.is_err(), "Connected before activation");
        assert!(provider.last_fix(Priority::Balanced).is_none());

        // Nothing to switch off yet
        provider.deactivate().await;
    }

    #[tokio::test]
    async fn test_watch_lifecycle() {
        let (listener, addr) = serve().await;
        let provider = GpsdProvider::new(addr);

        provider
            .activate(&LocationRequest::default())
            .await
            .expect("Failed to activate");
        let (mut server, _) = listener.accept().await.unwrap();
        assert!(read_command(&mut server).await.starts_with("?WATCH={\"enable\":true"));

        server
            .write_all(format!("{TPV_2D}\n{TPV_3D}\n").as_bytes())
            .await
            .unwrap();

        let fix = wait_for_fix(&provider, Priority::HighAccuracy)
            .await
            .expect("Never got a fix");
        assert_eq!(fix.latitude, 37.422);

        provider.deactivate().await;
        assert!(read_command(&mut server).await.starts_with("?WATCH={\"enable\":false"));
        assert!(provider.last_fix(Priority::Balanced).is_none());
    }

    #[tokio::test]
    async fn test_connection_loss_clears_fix() {
        let (listener, addr) = serve().await;
        let provider = GpsdProvider::new(addr);

        provider
            .activate(&LocationRequest::default())
            .await
            .expect("Failed to activate");
        let (mut server, _) = listener.accept().await.unwrap();
        read_command(&mut server).await;

        server
            .write_all(format!("{TPV_2D}\n").as_bytes())
            .await
            .unwrap();
        assert!(wait_for_fix(&provider, Priority::Balanced).await.is_some());

        drop(server);

        for _ in 0..200 {
            if provider.last_fix(Priority::Balanced).is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Fix kept after gpsd went away");
    }

    #[tokio::test]
    async fn test_reconnects_on_next_activation() {
        let (listener, addr) = serve().await;
        let provider = GpsdProvider::new(addr);

        provider
            .activate(&LocationRequest::default())
            .await
            .expect("Failed to activate");
        let (server, _) = listener.accept().await.unwrap();
        drop(server);

        // Give the reader a moment to notice gpsd went away
        for _ in 0..200 {
            let closed = provider
                .conn
                .lock()
                .await
                .as_ref()
                .is_some_and(|c| c.closed.is_cancelled());
            if closed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        provider
            .activate(&LocationRequest::default())
            .await
            .expect("Failed to reactivate");
        let (mut server, _) = listener.accept().await.unwrap();
        assert!(read_command(&mut server).await.starts_with("?WATCH={\"enable\":true"));
    }

    #[tokio::test]
    async fn test_unreachable_gpsd_fails_activation() {
        let (listener, addr) = serve().await;
        drop(listener);

        let provider = GpsdProvider::new(addr);
        assert!(provider.activate(&LocationRequest::default()).await.is_err());
        assert!(provider.last_fix(Priority::Balanced).is_none());
    }
}
