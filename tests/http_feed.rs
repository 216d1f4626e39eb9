use anyhow::Result;
use reqwest::Client;
use serde_json::{json, Map};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workshop_feed::{
    fetch::{HttpSource, PublishedSheet},
    lead::{Attribution, Lead, LeadSubmitter},
    schedule::{DisplayState, GroupLinkLoader, ScheduleLoader},
    tracking::{HttpTransport, Tracker, PAGE_VIEW},
};

const SHEET_PATH: &str = "/spreadsheets/d/e/2PACX-test/pub";

fn sheet(server: &MockServer) -> Result<PublishedSheet> {
    PublishedSheet::from_link(&format!(
        "{}/spreadsheets/d/e/2PACX-test/pubhtml#gid=42",
        server.uri()
    ))
}

fn csv(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/csv")
        .set_body_string(body)
}

fn schedule_loader(server: &MockServer) -> Result<ScheduleLoader<HttpSource>> {
    Ok(ScheduleLoader::new(
        HttpSource::new(Client::new()),
        &sheet(server)?,
        Duration::from_secs(5),
    ))
}

#[tokio::test]
async fn schedule_from_configured_tab_without_cache() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(query_param("gid", "42"))
        .and(query_param("output", "csv"))
        .and(header("cache-control", "no-cache"))
        .respond_with(csv("Date,Time\n12 Dec,3 PM IST\n"))
        .expect(1)
        .mount(&server)
        .await;

    let state = schedule_loader(&server)?.load().await;
    assert_eq!(
        state,
        DisplayState::Ready {
            date: "12 Dec".into(),
            time: "3 PM IST".into()
        }
    );
    Ok(())
}

#[tokio::test]
async fn schedule_falls_back_after_404() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(query_param("gid", "42"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(csv("Schedule,Hours\r\n\r\n15 Jan,10 AM\r\n"))
        .mount(&server)
        .await;

    let mut session = schedule_loader(&server)?.spawn();
    assert_eq!(
        session.settled().await,
        DisplayState::Ready {
            date: "15 Jan".into(),
            time: "10 AM".into()
        }
    );
    Ok(())
}

#[tokio::test]
async fn schedule_unavailable_when_no_tab_has_known_headers() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(csv("Name,Email\nAnn,ann@example.com\n"))
        .expect(3)
        .mount(&server)
        .await;

    let state = schedule_loader(&server)?.load().await;
    assert_eq!(state, DisplayState::Unavailable);
    assert_eq!(state.labels(), ("—".to_string(), "—".to_string()));
    Ok(())
}

#[tokio::test]
async fn slow_tab_does_not_stall_the_chain() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .and(query_param("gid", "42"))
        .respond_with(csv("Date,Time\nlate,late\n").set_delay(Duration::from_secs(10)))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(csv("Date,Time\n12 Dec,3 PM\n"))
        .mount(&server)
        .await;

    let loader = ScheduleLoader::new(
        HttpSource::new(Client::new()),
        &sheet(&server)?,
        Duration::from_millis(200),
    );
    assert_eq!(
        loader.load().await,
        DisplayState::Ready {
            date: "12 Dec".into(),
            time: "3 PM".into()
        }
    );
    Ok(())
}

#[tokio::test]
async fn group_link_from_first_tab() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SHEET_PATH))
        .respond_with(csv("Batch,WhatsApp\nDec,https://chat.example.com/dec\n"))
        .mount(&server)
        .await;

    let loader = GroupLinkLoader::new(
        HttpSource::new(Client::new()),
        &sheet(&server)?,
        "https://join.example.com/fallback",
        Duration::from_secs(5),
    );
    assert_eq!(loader.load().await, "https://chat.example.com/dec");
    Ok(())
}

fn lead() -> Lead {
    Lead {
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        phone: "+91 98765 43210".into(),
        profession: "Analyst".into(),
    }
}

#[tokio::test]
async fn lead_posts_webhook_then_redirects() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook/form"))
        .and(body_partial_json(json!({
            "name": "Asha Rao",
            "email": "asha@example.com",
            "phone": "9198765432",
            "utm_source": "fb",
            "page_url": "https://masterclass.example.com/?utm_source=fb",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let submitter = LeadSubmitter::new(
        Client::new(),
        Url::parse(&format!("{}/webhook/form", server.uri()))?,
        Url::parse("https://pay.example.com/pl_1/view")?,
    );
    let page = Url::parse("https://masterclass.example.com/?utm_source=fb")?;
    let attribution = Attribution::from_url(&page);

    let redirect = submitter.submit(&lead(), &attribution, &page).await?;
    assert_eq!(redirect.host_str(), Some("pay.example.com"));
    assert!(redirect
        .query_pairs()
        .any(|(k, v)| k == "utm_source" && v == "fb"));
    assert!(redirect
        .query_pairs()
        .any(|(k, v)| k == "phone" && v == "9198765432"));
    Ok(())
}

#[tokio::test]
async fn lead_redirects_even_when_webhook_fails() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let submitter = LeadSubmitter::new(
        Client::new(),
        Url::parse(&format!("{}/webhook/form", server.uri()))?,
        Url::parse("https://pay.example.com/pl_1/view")?,
    );
    let page = Url::parse("https://masterclass.example.com/")?;
    let redirect = submitter
        .submit(&lead(), &Attribution::default(), &page)
        .await?;
    assert_eq!(redirect.path(), "/pl_1/view");
    Ok(())
}

#[tokio::test]
async fn invalid_lead_is_rejected_before_any_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let submitter = LeadSubmitter::new(
        Client::new(),
        Url::parse(&format!("{}/webhook/form", server.uri()))?,
        Url::parse("https://pay.example.com/pl_1/view")?,
    );
    let mut bad = lead();
    bad.email = "nope".into();
    let page = Url::parse("https://masterclass.example.com/")?;
    assert!(submitter
        .submit(&bad, &Attribution::default(), &page)
        .await
        .is_err());

    let mut no_profession = lead();
    no_profession.profession.clear();
    assert!(submitter
        .submit(&no_profession, &Attribution::default(), &page)
        .await
        .is_err());
    Ok(())
}

#[tokio::test]
async fn pixel_sends_page_view_once_then_events() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v18.0/px-1/events"))
        .and(body_partial_json(json!({ "data": [{ "event_name": PAGE_VIEW }] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v18.0/px-1/events"))
        .and(body_partial_json(json!({ "data": [{ "event_name": "Purchase" }] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(
        Client::new(),
        Url::parse(&format!("{}/v18.0", server.uri()))?,
        None,
    );
    let tracker = Tracker::new("px-1", transport);

    let (a, b) = tokio::join!(
        tracker.track("Purchase", Map::new()),
        tracker.track("Purchase", Map::new())
    );
    assert!(a? && b?);
    Ok(())
}
