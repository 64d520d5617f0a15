//! REST client tests against a local mock server.

use mockito::Matcher;
use visit_sync_core::config::VISIT_EXPANSION;
use visit_sync_core::models::{Patient, Resource};
use visit_sync_core::sync::LastVitalsQuery;
use visit_sync_core::{RemoteError, RemoteVisitSource, Visit, VisitType};
use visit_sync_rest::RestVisitSource;

const VISITS_BODY: &str = r#"{
    "results": [
        {
            "uuid": "visit-1",
            "location": {"uuid": "loc-1", "display": "Outpatient Clinic"},
            "visitType": {"uuid": "vt-1", "display": "Facility Visit"},
            "startDatetime": "2024-01-15T10:00:00.000+0000",
            "stopDatetime": null,
            "encounters": [
                {
                    "uuid": "enc-1",
                    "display": "Vitals 15/01/2024",
                    "encounterDatetime": "2024-01-15T10:05:00.000+0000",
                    "encounterType": {"uuid": "67a71486-1a54-468f-ac3e-7091a9a79584", "display": "Vitals"},
                    "obs": [{"uuid": "obs-1", "display": "Pulse: 72.0"}]
                }
            ]
        }
    ]
}"#;

#[tokio::test]
async fn test_find_visits_sends_expansion() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/openmrs/ws/rest/v1/visit")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("patient".into(), "patient-1".into()),
            Matcher::UrlEncoded("v".into(), VISIT_EXPANSION.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(VISITS_BODY)
        .create_async()
        .await;

    let source = RestVisitSource::new(&format!("{}/openmrs", server.url())).unwrap();
    let visits = source.find_visits("patient-1", VISIT_EXPANSION).await.unwrap();

    mock.assert_async().await;
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].uuid.as_deref(), Some("visit-1"));
    assert!(visits[0].is_active());
    assert_eq!(visits[0].encounters[0].observations.len(), 1);
}

#[tokio::test]
async fn test_find_visits_empty_results() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ws/rest/v1/visit")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"results": []}"#)
        .create_async()
        .await;

    let source = RestVisitSource::new(&server.url()).unwrap();
    let visits = source.find_visits("patient-1", VISIT_EXPANSION).await.unwrap();
    assert!(visits.is_empty());
}

#[tokio::test]
async fn test_non_success_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ws/rest/v1/visit")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"error": {"message": "Something went wrong"}}"#)
        .create_async()
        .await;

    let source = RestVisitSource::new(&server.url()).unwrap();
    let err = source
        .find_visits("patient-1", VISIT_EXPANSION)
        .await
        .unwrap_err();

    assert_eq!(err, RemoteError::api(500, "Something went wrong"));
}

#[tokio::test]
async fn test_non_success_without_body_uses_reason() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ws/rest/v1/visittype")
        .with_status(404)
        .create_async()
        .await;

    let source = RestVisitSource::new(&server.url()).unwrap();
    let err = source.get_visit_types().await.unwrap_err();
    assert_eq!(err, RemoteError::api(404, "Not Found"));
}

#[tokio::test]
async fn test_undecodable_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ws/rest/v1/visittype")
        .with_status(200)
        .with_body("<html>login</html>")
        .create_async()
        .await;

    let source = RestVisitSource::new(&server.url()).unwrap();
    let err = source.get_visit_types().await.unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let source = RestVisitSource::new("http://127.0.0.1:9").unwrap();
    let err = source.get_visit_types().await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}

#[tokio::test]
async fn test_get_last_vitals_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/ws/rest/v1/encounter")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("patient".into(), "patient-1".into()),
            Matcher::UrlEncoded("encounterType".into(), "vitals-type".into()),
            Matcher::UrlEncoded("v".into(), "full".into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
            Matcher::UrlEncoded("order".into(), "desc".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"results": [{"uuid": "enc-9", "obs": []}]}"#)
        .create_async()
        .await;

    let source = RestVisitSource::new(&server.url()).unwrap();
    let encounters = source
        .get_last_vitals(&LastVitalsQuery::latest("patient-1", "vitals-type"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(encounters.len(), 1);
    assert_eq!(encounters[0].uuid.as_deref(), Some("enc-9"));
}

#[tokio::test]
async fn test_get_visit_types() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ws/rest/v1/visittype")
        .with_status(200)
        .with_body(
            r#"{"results": [
                {"uuid": "vt-1", "display": "Facility Visit"},
                {"uuid": "vt-2", "display": "Home Visit"}
            ]}"#,
        )
        .create_async()
        .await;

    let source = RestVisitSource::new(&server.url()).unwrap();
    let types = source.get_visit_types().await.unwrap();
    assert_eq!(
        types.iter().map(VisitType::name).collect::<Vec<_>>(),
        vec!["Facility Visit", "Home Visit"]
    );
}

#[tokio::test]
async fn test_create_visit_posts_references() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/ws/rest/v1/visit")
        .match_body(Matcher::Json(serde_json::json!({
            "patient": "patient-1",
            "location": "loc-1",
            "visitType": "vt-1",
            "startDatetime": "2024-01-15T10:00:00.000+0000"
        })))
        .with_status(201)
        .with_body(
            r#"{
                "uuid": "visit-new",
                "patient": {"uuid": "patient-1", "display": "John Doe"},
                "location": {"uuid": "loc-1", "display": "Outpatient Clinic"},
                "visitType": {"uuid": "vt-1", "display": "Facility Visit"},
                "startDatetime": "2024-01-15T10:00:00.000+0000",
                "stopDatetime": null,
                "encounters": []
            }"#,
        )
        .create_async()
        .await;

    let request = Visit {
        patient: Some(Patient::new("patient-1")),
        location: Some(Resource::with_display("loc-1", "Outpatient Clinic")),
        visit_type: Some(VisitType::new("vt-1")),
        start_datetime: Some("2024-01-15T10:00:00.000+0000".into()),
        ..Default::default()
    };

    let source = RestVisitSource::new(&server.url()).unwrap();
    let created = source.create_visit(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(created.uuid.as_deref(), Some("visit-new"));
    assert_eq!(created.patient.unwrap().display.as_deref(), Some("John Doe"));
}
