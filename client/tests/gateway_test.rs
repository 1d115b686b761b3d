//! Gateway client against a mock gateway.

#![allow(clippy::unwrap_used)]

use ourbusway_client::incidents::{IncidentStatus, IncidentType, ReportIncidentRequest};
use ourbusway_client::routes::{
    CreateRouteRequest, CreateStationRequest, RouteConfig, RouteConfigUpdate, ServicePeriodType,
    UpdateRouteRequest, UpdateStationRequest,
};
use ourbusway_client::trips::{EndTripRequest, StartTripRequest, TripStatus};
use ourbusway_client::{ApiClient, ApiConfig, ApiError, LoginRequest};
use ourbusway_core::error::GatewayError;
use ourbusway_core::payment::PaymentGateway;
use ourbusway_core::session::Session;
use ourbusway_core::types::{PurchaseRequestReference, SubscriptionRequestId, TicketRequestId};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ApiConfig::new(server.uri())).unwrap()
}

fn user_json() -> serde_json::Value {
    json!({
        "id": "u-1",
        "email": "amina@example.com",
        "firstName": "Amina",
        "lastName": "Alaoui",
        "role": "PASSENGER"
    })
}

#[tokio::test]
async fn test_login_returns_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authMgtApi/login"))
        .and(body_json(json!({"email": "amina@example.com", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-1", "user": user_json()})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .auth()
        .login(&LoginRequest {
            email: "amina@example.com".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();

    let session = Session::from(response);
    assert_eq!(session.token(), "jwt-1");
    assert_eq!(session.user.display_name(), "Amina Alaoui");
}

#[tokio::test]
async fn test_session_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authMgtApi/users/profile"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-1",
            "email": "amina@example.com",
            "firstName": "Amina",
            "lastName": "Alaoui",
            "mobile": "0600000000",
            "role": "PASSENGER"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let user = serde_json::from_value(user_json()).unwrap();
    let profile = client
        .with_session(&Session::new("jwt-1", user))
        .auth()
        .profile()
        .await
        .unwrap();

    assert_eq!(profile.mobile, "0600000000");
    assert_eq!(profile.address, None);
}

#[tokio::test]
async fn test_unauthorized_and_forbidden() {
    let server = MockServer::start().await;
    Mock::given(path("/ticketMgtApi/history"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(path("/ticketMgtApi/t-1/inspect"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "Controllers only"})))
        .mount(&server)
        .await;

    let tickets = client_for(&server).await.tickets();

    let err = tickets.history(0, 10).await.unwrap_err();
    assert!(err.is_unauthorized());

    let err = tickets.inspect("t-1").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Forbidden {
            message: Some("Controllers only".to_string())
        }
    );
}

#[tokio::test]
async fn test_ticket_history_is_paginated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ticketMgtApi/history"))
        .and(query_param("page", "1"))
        .and(query_param("size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{
                "id": "t-1",
                "userId": "u-1",
                "routeId": "r-1",
                "purchaseDate": "2025-01-01T10:00:00",
                "price": 7.5,
                "status": "ACTIVE"
            }],
            "totalElements": 6,
            "totalPages": 2,
            "size": 5,
            "number": 1
        })))
        .mount(&server)
        .await;

    let page = client_for(&server).await.tickets().history(1, 5).await.unwrap();

    assert_eq!(page.content.len(), 1);
    assert_eq!(page.content[0].price, Decimal::new(75, 1));
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_ticket_pdf_returns_bytes() {
    let server = MockServer::start().await;
    Mock::given(path("/ticketMgtApi/t-1/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .mount(&server)
        .await;

    let bytes = client_for(&server).await.tickets().pdf("t-1").await.unwrap();
    assert_eq!(bytes, b"%PDF-1.7");
}

#[tokio::test]
async fn test_missing_subscription_is_none() {
    let server = MockServer::start().await;
    Mock::given(path("/subscriptionMgtApi/subscription/me"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mine = client_for(&server).await.subscriptions().mine().await.unwrap();
    assert_eq!(mine, None);
}

#[tokio::test]
async fn test_subscription_inspection() {
    let server = MockServer::start().await;
    Mock::given(path("/subscriptionMgtApi/subscription/s-1/inspect"))
        .and(query_param("tripId", "trip-9"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(path("/subscriptionMgtApi/subscription/s-2/inspect"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Subscription expired"))
        .mount(&server)
        .await;

    let subscriptions = client_for(&server).await.subscriptions();

    let ok = subscriptions.inspect("s-1", "trip-9").await;
    assert!(ok.valid);
    assert_eq!(ok.message, "Subscription is valid for this trip");

    let expired = subscriptions.inspect("s-2", "trip-9").await;
    assert!(!expired.valid);
    assert_eq!(expired.message, "Subscription expired");
}

#[tokio::test]
async fn test_process_payment_sends_only_present_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/paymentMgtApi/payments/process"))
        .and(body_json(json!({"subscriptionRequestId": "sr-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paymentIntentId": "pi_1",
            "clientSecret": "pi_1_secret_abc",
            "amount": 150,
            "currency": "MAD"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payments = client_for(&server).await.payments();
    let reference =
        PurchaseRequestReference::Subscription(SubscriptionRequestId::new("sr-1").unwrap());
    let intent = payments.process_payment(&reference).await.unwrap();

    assert_eq!(intent.provider_intent_id, "pi_1");
    assert_eq!(intent.client_secret.intent_id(), Some("pi_1"));
    assert_eq!(intent.display_amount(), "150.00 MAD");
}

#[tokio::test]
async fn test_process_payment_not_ready_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(path("/paymentMgtApi/payments/process"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Ticket request not found"})),
        )
        .mount(&server)
        .await;

    let payments = client_for(&server).await.payments();
    let reference = PurchaseRequestReference::Ticket(TicketRequestId::new("tr-1").unwrap());
    let err = payments.process_payment(&reference).await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::Status {
            status: 404,
            message: Some("Ticket request not found".to_string()),
        }
    );
}

#[tokio::test]
async fn test_unreachable_gateway_is_transport_error() {
    let client = ApiClient::new(&ApiConfig::new("http://127.0.0.1:9")).unwrap();
    let reference = PurchaseRequestReference::Ticket(TicketRequestId::new("tr-1").unwrap());

    let err = client.payments().process_payment(&reference).await.unwrap_err();

    assert!(matches!(err, GatewayError::Transport(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_admin_stats_decode() {
    let server = MockServer::start().await;
    Mock::given(path("/subscriptionMgtApi/subscription/stats/total-revenue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalRevenue": 1200.5,
            "currency": "MAD",
            "totalCount": 8,
            "revenueByPlan": {"MONTHLY": 800.5, "ANNUAL": 400},
            "countByPlan": {"MONTHLY": 6, "ANNUAL": 2}
        })))
        .mount(&server)
        .await;

    let total = client_for(&server)
        .await
        .admin_stats()
        .total_subscription_revenue()
        .await
        .unwrap();

    assert_eq!(total.total_revenue, Decimal::new(12005, 1));
    assert_eq!(total.count_by_plan.get("MONTHLY"), Some(&6));
}

fn trip_json(status: &str) -> serde_json::Value {
    json!({
        "id": "trip-1",
        "routeId": "r-1",
        "busId": "b-7",
        "driverId": "d-1",
        "startTime": "2025-11-28T18:46:11.142",
        "status": status
    })
}

#[tokio::test]
async fn test_trip_start_and_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/routeMgtApi/trips/startTrip"))
        .and(body_json(json!({"routeId": "r-1", "busId": "b-7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(trip_json("IN_PROGRESS")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/routeMgtApi/trips/endTrip/trip-1"))
        .and(body_json(json!({"notes": "No issues"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(trip_json("COMPLETED")))
        .expect(1)
        .mount(&server)
        .await;

    let trips = client_for(&server).await.trips();
    let started = trips
        .start(&StartTripRequest {
            route_id: "r-1".to_string(),
            bus_id: Some("b-7".to_string()),
            start_time: None,
        })
        .await
        .unwrap();
    assert!(started.is_in_progress());

    let ended = trips
        .end(
            &started.id,
            &EndTripRequest {
                notes: Some("No issues".to_string()),
                ..EndTripRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ended.status, TripStatus::Completed);
}

#[tokio::test]
async fn test_current_trip_is_none_once_gone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routeMgtApi/trips/trip-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(trip_json("IN_PROGRESS")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/routeMgtApi/trips/trip-2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/routeMgtApi/trips/trip-3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let trips = client_for(&server).await.trips();
    assert_eq!(
        trips.current("trip-1").await.unwrap().map(|t| t.id),
        Some("trip-1".to_string())
    );
    assert_eq!(trips.current("trip-2").await.unwrap(), None);
    assert_eq!(trips.current("trip-3").await.unwrap_err().status(), Some(500));
}

#[tokio::test]
async fn test_driver_trip_listings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/routeMgtApi/trips/history"))
        .and(query_param("page", "0"))
        .and(query_param("size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [trip_json("COMPLETED")],
            "totalElements": 1,
            "totalPages": 1,
            "size": 10,
            "number": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/routeMgtApi/trips/driver"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([trip_json("COMPLETED"), trip_json("CANCELLED")])),
        )
        .mount(&server)
        .await;

    let trips = client_for(&server).await.trips();
    let history = trips.history(0, 10).await.unwrap();
    assert_eq!(history.content[0].status, TripStatus::Completed);
    assert!(!history.has_next());

    let all = trips.driver_trips().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].status, TripStatus::Cancelled);
}

fn incident_json() -> serde_json::Value {
    json!({
        "id": "inc-1",
        "driverId": "d-1",
        "routeId": "r-1",
        "busId": "b-7",
        "type": "INCIDENT",
        "status": "OPEN",
        "description": "Flat tyre",
        "reportedAt": "2025-01-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_report_incident_keeps_given_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/incidentMgtApi/incidents"))
        .and(body_json(json!({
            "routeId": "r-1",
            "type": "INCIDENT",
            "description": "Flat tyre",
            "reportedAt": "2025-01-01T10:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(incident_json()))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = ReportIncidentRequest::new(IncidentType::Incident, "Flat tyre");
    request.route_id = Some("r-1".to_string());
    request.reported_at = Some("2025-01-01T10:00:00Z".to_string());
    let incident = client_for(&server)
        .await
        .incidents()
        .report(&request)
        .await
        .unwrap();

    assert_eq!(incident.status, IncidentStatus::Open);
    assert_eq!(incident.resolved_at, None);
}

#[tokio::test]
async fn test_report_incident_stamps_missing_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/incidentMgtApi/incidents"))
        .and(body_partial_json(json!({"type": "DELAY", "description": "Traffic"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(incident_json()))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .await
        .incidents()
        .report(&ReportIncidentRequest::new(IncidentType::Delay, "Traffic"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let reported_at = body["reportedAt"].as_str().unwrap();
    assert!(reported_at.ends_with("+00:00"), "{reported_at}");
}

fn route_json(active: bool) -> serde_json::Value {
    json!({
        "id": "r-12",
        "number": "12",
        "name": "Casa - Rabat",
        "active": active,
        "startStation": "Casa Voyageurs",
        "endStation": "Rabat Ville",
        "distance": 87.5,
        "estimatedDuration": 75,
        "price": 25
    })
}

#[tokio::test]
async fn test_route_admin_writes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/routeMgtApi/routes"))
        .and(header("authorization", "Bearer admin-jwt"))
        .and(body_partial_json(json!({
            "number": "12",
            "price": 25.0,
            "config": {"ruleType": "WEEKDAY", "busCount": 3},
            "stationIds": ["s-1", "s-2"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(route_json(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/routeMgtApi/routes/r-12"))
        .and(body_json(json!({"active": false, "config": {"busCount": 4}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(route_json(false)))
        .expect(1)
        .mount(&server)
        .await;

    let routes = client_for(&server).await.with_token("admin-jwt").routes();
    let created = routes
        .create_route(&CreateRouteRequest {
            number: "12".to_string(),
            name: "Casa - Rabat".to_string(),
            description: String::new(),
            active: true,
            start_station: "Casa Voyageurs".to_string(),
            end_station: "Rabat Ville".to_string(),
            distance: 87.5,
            estimated_duration: 75,
            price: Decimal::new(25, 0),
            config: RouteConfig {
                rule_type: ServicePeriodType::Weekday,
                frequency_minutes: 30,
                enabled: true,
                bus_count: 3,
                first_departure: "06:00:00".to_string(),
                start_date: "2025-01-01".to_string(),
                end_date: "2025-12-31".to_string(),
            },
            station_ids: vec!["s-1".to_string(), "s-2".to_string()],
        })
        .await
        .unwrap();
    assert!(created.active);
    assert_eq!(created.config, None);

    let updated = routes
        .update_route(
            &created.id,
            &UpdateRouteRequest {
                active: Some(false),
                config: Some(RouteConfigUpdate {
                    bus_count: Some(4),
                    ..RouteConfigUpdate::default()
                }),
                ..UpdateRouteRequest::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.active);
}

#[tokio::test]
async fn test_station_admin_calls() {
    let server = MockServer::start().await;
    let station = json!({
        "id": "s-1",
        "name": "Casa Voyageurs",
        "code": "CAV",
        "address": "Bd Mohammed V",
        "latitude": 33.59,
        "longitude": -7.59,
        "active": true
    });
    Mock::given(method("GET"))
        .and(path("/routeMgtApi/stations/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(station.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/routeMgtApi/stations"))
        .and(body_json(json!({
            "name": "Casa Voyageurs",
            "code": "CAV",
            "address": "Bd Mohammed V",
            "latitude": 33.59,
            "longitude": -7.59
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(station.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/routeMgtApi/stations/s-1"))
        .and(body_json(json!({"active": false})))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let routes = client_for(&server).await.routes();
    let fetched = routes.station("s-1").await.unwrap();
    assert_eq!(fetched.active, Some(true));

    let created = routes
        .create_station(&CreateStationRequest {
            name: "Casa Voyageurs".to_string(),
            code: "CAV".to_string(),
            address: "Bd Mohammed V".to_string(),
            latitude: 33.59,
            longitude: -7.59,
        })
        .await
        .unwrap();
    assert_eq!(created, fetched);

    let err = routes
        .update_station(
            "s-1",
            &UpdateStationRequest {
                active: Some(false),
                ..UpdateStationRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }));
}
