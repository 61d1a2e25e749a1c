//! End-to-end behavior of intake, upload and status projection.

mod common;

use common::{
    DelayedKeySource, FakeHost, HangingKeySource, IMGBB_OK, intake_with, png_bytes, png_source,
};
use picture_verifier_lib::commands::images;
use picture_verifier_lib::error::IntakeError;
use picture_verifier_lib::models::intake_types::{ImageSource, NoticeLevel};
use picture_verifier_lib::models::status_types::{StatusColor, UploadPhase};
use picture_verifier_lib::services::credential_service::CredentialProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[tokio::test]
async fn drop_of_five_keeps_first_four() {
    let host = Arc::new(FakeHost::replying(200, IMGBB_OK));
    let intake = intake_with(host, CredentialProvider::fixed(Some("key".into())));

    let outcome = intake.accept_batch((1..=5).map(|i| png_source(&format!("img{}.png", i))));

    assert_eq!(outcome.accepted.len(), 4);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].0, "img5.png");
    assert_eq!(outcome.rejected[0].1, IntakeError::CapacityExceeded { max: 4 });
    assert_eq!(intake.len(), 4);

    let notices = outcome.notices();
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, "You can upload up to 4 images.");
}

#[tokio::test]
async fn every_rejection_past_capacity_is_reported() {
    let host = Arc::new(FakeHost::replying(200, IMGBB_OK));
    let intake = intake_with(host, CredentialProvider::fixed(None));

    let mut sources: Vec<ImageSource> = (0..3).map(|i| png_source(&format!("{}.png", i))).collect();
    sources.insert(1, ImageSource::from_bytes("bad.gif", b"GIF89a garbage".to_vec()));
    sources.extend((3..6).map(|i| png_source(&format!("{}.png", i))));

    let outcome = intake.accept_batch(sources);
    assert_eq!(outcome.accepted.len(), 4);
    let reasons: Vec<&IntakeError> = outcome.rejected.iter().map(|(_, e)| e).collect();
    assert!(matches!(reasons[0], IntakeError::Decode { .. }));
    assert_eq!(reasons.len(), 3);
    assert!(reasons[1..].iter().all(|e| **e == IntakeError::CapacityExceeded { max: 4 }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_never_exceed_capacity() {
    let host = Arc::new(FakeHost::replying(200, IMGBB_OK));
    let intake = intake_with(host, CredentialProvider::fixed(None));

    let workers: Vec<_> = (0..10)
        .map(|i| {
            let intake = intake.clone();
            std::thread::spawn(move || intake.accept(png_source(&format!("t{}.png", i))).is_ok())
        })
        .collect();
    let accepted = workers
        .into_iter()
        .map(|w| w.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(accepted, 4);
    assert_eq!(intake.len(), 4);
}

#[tokio::test]
async fn successful_upload_ends_green_at_100() {
    let host = Arc::new(FakeHost::replying(200, IMGBB_OK));
    let intake = intake_with(host.clone(), CredentialProvider::fixed(Some("key".into())));

    let id = intake.accept(png_source("ok.png")).unwrap();
    intake.wait_for_uploads().await;

    let status = intake.status(id).unwrap();
    assert_eq!(status.phase, UploadPhase::Succeeded);
    assert_eq!(status.progress_percent, 100.0);
    assert!(!status.progress_visible);
    assert_eq!(status.color(), StatusColor::Green);
    assert_eq!(status.remote_url.as_deref(), Some("https://i.ibb.co/w04Prt6/c1f64245afb2.png"));
    assert_eq!(host.call_count(), 1);
}

#[tokio::test]
async fn server_error_ends_orange_without_url() {
    let host = Arc::new(FakeHost::replying(500, r#"{"error":{"message":"oops"}}"#));
    let intake = intake_with(host.clone(), CredentialProvider::fixed(Some("key".into())));

    let id = intake.accept(png_source("err.png")).unwrap();
    intake.wait_for_uploads().await;

    let status = intake.status(id).unwrap();
    assert_eq!(status.phase, UploadPhase::Fallback);
    assert_eq!(status.icon(), "⚠");
    assert_eq!(status.color(), StatusColor::Orange);
    assert!(status.remote_url.is_none());
    assert_ne!(status.progress_percent, 100.0);
}

#[tokio::test]
async fn progress_never_goes_backwards() {
    let gate = Arc::new(Notify::new());
    let host = Arc::new(FakeHost::gated(200, IMGBB_OK, gate.clone()));
    let intake = intake_with(host, CredentialProvider::fixed(Some("key".into())));

    let big = ImageSource::from_bytes("big.png", png_bytes(600, 400));
    let id = intake.accept(big).unwrap();
    let mut rx = intake.subscribe(id).unwrap();

    let mut seen = vec![rx.borrow_and_update().progress_percent];
    let mut released = false;
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let status = rx.borrow_and_update().clone();
        seen.push(status.progress_percent);
        if status.phase.is_terminal() {
            assert_eq!(status.phase, UploadPhase::Succeeded);
            break;
        }
        if !released && status.progress_percent >= 99.0 {
            gate.notify_one();
            released = true;
        }
    }

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
    assert_eq!(seen.last().copied(), Some(100.0));
    assert!(seen[..seen.len() - 1].iter().all(|p| *p < 100.0));
}

#[tokio::test]
async fn key_fetch_timeout_means_no_upload_attempts() {
    let host = Arc::new(FakeHost::replying(200, IMGBB_OK));
    let credentials = CredentialProvider::spawn(Arc::new(HangingKeySource), Duration::from_millis(50));
    let intake = intake_with(host.clone(), credentials.clone());

    let outcome = images::add_image_bytes(&intake, "a.png".into(), png_bytes(8, 8));
    assert_eq!(outcome.accepted.len(), 1);
    intake.wait_for_uploads().await;
    intake.accept(png_source("b.png")).unwrap();
    intake.wait_for_uploads().await;

    for image in intake.snapshot() {
        assert_eq!(image.status.phase, UploadPhase::Fallback);
        assert!(!image.status.progress_visible);
    }
    assert_eq!(host.call_count(), 0);
    // Uploads fell back before the fetch gave up; the notice follows it.
    assert_eq!(credentials.current().await, None);
    assert_eq!(credentials.take_notice().map(|n| n.level), Some(NoticeLevel::Warning));
}

#[tokio::test]
async fn intake_during_key_fetch_falls_back_without_waiting() {
    let host = Arc::new(FakeHost::replying(200, IMGBB_OK));
    let slow = DelayedKeySource { delay: Duration::from_millis(300) };
    let credentials = CredentialProvider::spawn(Arc::new(slow), Duration::from_secs(5));
    let intake = intake_with(host.clone(), credentials.clone());

    let early = intake.accept(png_source("early.png")).unwrap();
    tokio::time::timeout(Duration::from_millis(250), intake.wait_for_uploads())
        .await
        .expect("upload must not wait for the key fetch");

    let status = intake.status(early).unwrap();
    assert_eq!(status.phase, UploadPhase::Fallback);
    assert!(!status.progress_visible);
    assert!(status.remote_url.is_none());
    assert_eq!(host.call_count(), 0);

    // Images added after the key arrives are uploaded normally.
    assert_eq!(credentials.current().await.as_deref(), Some("late-key"));
    let late = intake.accept(png_source("late.png")).unwrap();
    intake.wait_for_uploads().await;
    assert_eq!(intake.status(late).unwrap().phase, UploadPhase::Succeeded);
    assert_eq!(intake.status(early).unwrap().phase, UploadPhase::Fallback);
    assert_eq!(host.call_count(), 1);
}

#[tokio::test]
async fn removing_mid_upload_does_not_resurrect() {
    let gate = Arc::new(Notify::new());
    let host = Arc::new(FakeHost::gated(200, IMGBB_OK, gate.clone()));
    let intake = intake_with(host.clone(), CredentialProvider::fixed(Some("key".into())));

    let keep = intake.accept(png_source("keep.png")).unwrap();
    let drop_me = intake.accept(png_source("drop.png")).unwrap();

    // Let both uploads reach the host, then pull one image out.
    while host.call_count() < 2 {
        tokio::task::yield_now().await;
    }
    assert!(intake.remove(drop_me));

    gate.notify_one();
    gate.notify_one();
    intake.wait_for_uploads().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let ids: Vec<_> = intake.snapshot().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![keep]);
    assert!(intake.status(drop_me).is_none());
}

#[tokio::test]
async fn folder_drop_goes_through_capacity_checks() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..6 {
        std::fs::write(dir.path().join(format!("photo{}.png", i)), png_bytes(16, 16)).unwrap();
    }
    std::fs::write(dir.path().join("readme.txt"), b"not an image").unwrap();

    let host = Arc::new(FakeHost::replying(200, IMGBB_OK));
    let intake = intake_with(host, CredentialProvider::fixed(None));

    let outcome = images::add_images(&intake, &[dir.path().to_path_buf()]);
    assert_eq!(outcome.accepted.len(), 4);
    assert_eq!(outcome.rejected.len(), 2);
    assert!(!images::can_accept_more(&intake));

    let names: Vec<String> = images::list_images(&intake).into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["photo0.png", "photo1.png", "photo2.png", "photo3.png"]);

    let uri = images::get_preview(&intake, outcome.accepted[0]).unwrap();
    assert!(uri.starts_with("data:image/jpeg;base64,"));
}
