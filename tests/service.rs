use std::io::Cursor;
use std::net::SocketAddr;

use image::{ImageFormat, Luma, Rgb, RgbImage};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use sobel_edge_service::common::config::{ClientConfig, ServerConfig};
use sobel_edge_service::common::connection::{read_frame, write_frame, DEFAULT_MAX_FRAME_SIZE};
use sobel_edge_service::common::protocol::{ErrorCode, Response};
use sobel_edge_service::processing::{codec, sobel, Image};
use sobel_edge_service::{ClientCore, ClientError, Server};

async fn start_server(mut config: ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.server.address = addr.to_string();

    tokio::spawn(async move {
        let server = Server::new(config);
        let _ = server.serve(listener).await;
    });
    addr
}

fn client(addr: SocketAddr) -> ClientCore {
    ClientCore::new(ClientConfig {
        server_address: addr.to_string(),
        ..ClientConfig::default()
    })
}

/// White square on black, as an RGB JPEG or PNG.
fn square_image(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(32, 32, |x, y| {
        if (8..24).contains(&x) && (8..24).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

#[tokio::test]
async fn test_png_request_returns_expected_mask() {
    let addr = start_server(ServerConfig::for_port(0, 200)).await;
    let request = square_image(ImageFormat::Png);

    let png = client(addr).detect_edges(&request).await.unwrap();

    let returned = image::load_from_memory(&png).unwrap();
    assert_eq!(returned.color(), image::ColorType::L8);

    let expected = sobel::detect(&codec::decode(&request).unwrap(), 200, 1).unwrap();
    assert_eq!(codec::decode(&png).unwrap(), expected);

    let mask = returned.to_luma8();
    assert_eq!(*mask.get_pixel(8, 16), Luma([255]));
    assert_eq!(*mask.get_pixel(16, 16), Luma([0]));
    assert_eq!(*mask.get_pixel(0, 0), Luma([0]));
}

#[tokio::test]
async fn test_jpeg_request_is_accepted() {
    let addr = start_server(ServerConfig::for_port(0, 300)).await;
    let png = client(addr)
        .detect_edges(&square_image(ImageFormat::Jpeg))
        .await
        .unwrap();

    let mask = codec::decode(&png).unwrap();
    assert_eq!((mask.width(), mask.height()), (32, 32));
    assert!(mask.pixels().iter().all(|&v| v == 0 || v == 255));
    assert!(mask.pixels().iter().any(|&v| v == 255));
}

#[tokio::test]
async fn test_unsupported_input_gets_decode_error_response() {
    let addr = start_server(ServerConfig::for_port(0, 200)).await;

    let err = client(addr)
        .detect_edges(b"this is not an image")
        .await
        .unwrap_err();
    match err {
        ClientError::Rejected { code, .. } => assert_eq!(code, ErrorCode::Decode),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_frame_is_refused_without_reading_payload() {
    let mut config = ServerConfig::for_port(0, 200);
    config.limits.max_frame_bytes = 1024;
    let addr = start_server(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    // Declare 1 MiB but send nothing after the header.
    stream.write_all(&(1024u32 * 1024).to_be_bytes()).await.unwrap();

    let payload = read_frame(&mut stream, DEFAULT_MAX_FRAME_SIZE).await.unwrap();
    match Response::from_bytes(&payload).unwrap() {
        Response::Failure { code, message } => {
            assert_eq!(code, ErrorCode::Transport);
            assert!(message.contains("too large"));
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_receives_refusal_of_oversized_request() {
    let mut config = ServerConfig::for_port(0, 200);
    config.limits.max_frame_bytes = 1024;
    let addr = start_server(config).await;

    let image_data = vec![7u8; 8 * 1024 * 1024];
    match client(addr).detect_edges(&image_data).await {
        Err(ClientError::Rejected { code, message }) => {
            assert_eq!(code, ErrorCode::Transport);
            assert!(message.contains("too large"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_client_closing_mid_header_does_not_affect_server() {
    let addr = start_server(ServerConfig::for_port(0, 200)).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&[0, 0]).await.unwrap();
    drop(stream);

    // The listener keeps serving other connections.
    let png = client(addr)
        .detect_edges(&square_image(ImageFormat::Png))
        .await
        .unwrap();
    assert!(!png.is_empty());
}

#[tokio::test]
async fn test_raw_frame_exchange_without_client_core() {
    let addr = start_server(ServerConfig::for_port(0, 50)).await;

    let mut spike = Image::filled(5, 5, 0);
    spike.set(2, 2, 255);

    let mut stream = TcpStream::connect(addr).await.unwrap();
    write_frame(&mut stream, &codec::encode(&spike).unwrap())
        .await
        .unwrap();
    let payload = read_frame(&mut stream, DEFAULT_MAX_FRAME_SIZE).await.unwrap();

    let png = match Response::from_bytes(&payload).unwrap() {
        Response::Edges(png) => png,
        other => panic!("unexpected response: {:?}", other),
    };
    let mask = codec::decode(&png).unwrap();
    for (x, y) in [(2, 1), (1, 2), (3, 2), (2, 3)] {
        assert_eq!(mask.get(x, y), 255);
    }
    for (x, y) in [(0, 0), (4, 0), (0, 4), (4, 4)] {
        assert_eq!(mask.get(x, y), 0);
    }
}

#[tokio::test]
async fn test_concurrent_clients() {
    let addr = start_server(ServerConfig::for_port(0, 200)).await;
    let request = square_image(ImageFormat::Png);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let request = request.clone();
        handles.push(tokio::spawn(async move {
            client(addr).detect_edges(&request).await.unwrap()
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_process_file_writes_mask() {
    let addr = start_server(ServerConfig::for_port(0, 200)).await;
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("square.png");
    let output = dir.path().join("edges.png");
    std::fs::write(&input, square_image(ImageFormat::Png)).unwrap();

    client(addr).process_file(&input, &output).await.unwrap();

    let written = std::fs::read(&output).unwrap();
    let mask = codec::decode(&written).unwrap();
    assert_eq!((mask.width(), mask.height()), (32, 32));
}

#[tokio::test]
async fn test_missing_input_file_is_io_error() {
    let addr = start_server(ServerConfig::for_port(0, 200)).await;
    let dir = tempfile::tempdir().unwrap();

    let err = client(addr)
        .process_file(dir.path().join("missing.png"), dir.path().join("out.png"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
}
