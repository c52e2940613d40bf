use super::{collect_config, setup_load_balancer, Protocol};
use crate::cli::ConfigArgs;
use crate::config::{self, Settings};
use crate::prompt::Prompter;
use crate::testing::RecordingRunner;
use std::io::Cursor;
use std::path::Path;

type Scripted = Prompter<Cursor<Vec<u8>>, Vec<u8>>;

fn unattended() -> Scripted {
    Prompter::new(Cursor::new(Vec::new()), Vec::new(), false)
}

fn scripted(input: &str) -> Scripted {
    Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), true)
}

fn settings() -> Settings {
    let args = ConfigArgs {
        gcp_project_id: Some("acme-prod".to_string()),
        ..ConfigArgs::default()
    };
    config::resolve(&args, Path::new("/nonexistent"), |_| None).expect("resolve settings")
}

#[test]
fn unattended_run_creates_every_resource() {
    let runner = RecordingRunner::new();
    setup_load_balancer(&runner, &mut unattended(), &settings()).expect("configured");

    assert_eq!(
        runner.runs(),
        vec![
            "gcloud compute health-checks create http service-1-hc --global --port=8080 --request-path=/healthz --project=acme-prod",
            "gcloud compute backend-services create service-1-backend --global --protocol=HTTP --port-name=http --health-checks=service-1-hc --load-balancing-scheme=EXTERNAL --enable-cdn --project=acme-prod",
            "gcloud compute url-maps create gcloud-lb-url-map --global --default-service=service-1-backend --project=acme-prod",
            "gcloud compute url-maps add-path-matcher gcloud-lb-url-map --global --path-matcher-name=gcloud-lb-paths --default-service=service-1-backend --new-hosts='*' --path-rules='/service-1/*=service-1-backend' --project=acme-prod",
            "gcloud compute target-http-proxies create gcloud-lb-proxy --global --url-map=gcloud-lb-url-map --project=acme-prod",
            "gcloud compute addresses create gcloud-lb-ip --global --project=acme-prod",
            "gcloud compute forwarding-rules create gcloud-lb-forwarding-rule --global --target-http-proxy=gcloud-lb-proxy --address=gcloud-lb-ip --ports=80 --project=acme-prod",
        ]
    );
    assert_eq!(
        runner.probes(),
        vec![
            "gcloud compute health-checks describe service-1-hc --global --project=acme-prod",
            "gcloud compute backend-services describe service-1-backend --global --project=acme-prod",
            "gcloud compute url-maps describe gcloud-lb-url-map --global --project=acme-prod",
            "gcloud compute target-http-proxies describe gcloud-lb-proxy --global --project=acme-prod",
            "gcloud compute addresses describe gcloud-lb-ip --global --project=acme-prod",
            "gcloud compute forwarding-rules describe gcloud-lb-forwarding-rule --global --project=acme-prod",
        ]
    );
}

#[test]
fn oversized_service_count_is_capped() {
    // Input runs out after the count, so every service takes its defaults.
    let mut prompter = scripted("\n\n\n\n\n300000000000000000\n");
    let config = collect_config(&mut prompter, "acme-prod").expect("config");
    assert_eq!(config.services.len(), 100);
    assert_eq!(config.services[0].name, "service-1");
    assert_eq!(config.services[99].name, "service-100");
}

#[test]
fn zero_services_becomes_one() {
    let mut prompter = scripted("\n\n\n\n\n0\n");
    let config = collect_config(&mut prompter, "acme-prod").expect("config");
    assert_eq!(config.services.len(), 1);
    assert_eq!(config.services[0].name, "service-1");
}

#[test]
fn interactive_services_route_by_path_over_https() {
    let runner = RecordingRunner::new();
    let mut prompter = scripted(
        "web-lb\n\n\n\ny\nweb-cert\n2\napi\nhttps\n9000\n\n\n\n\n/static/*\ny\n",
    );
    setup_load_balancer(&runner, &mut prompter, &settings()).expect("configured");

    let runs = runner.runs();
    assert_eq!(runs.len(), 9, "unexpected runs: {runs:#?}");
    assert!(runs[0].contains("create http api-hc"));
    assert!(runs[1].contains("create http service-2-hc"));
    assert!(runs[2].contains("create api-backend --global --protocol=HTTPS"));
    assert!(runs[3].contains("create service-2-backend --global --protocol=HTTP "));
    assert!(runs[5].contains(
        "--path-rules='/api/*=api-backend,/static/*=service-2-backend'"
    ));
    assert_eq!(
        runs[6],
        "gcloud compute target-https-proxies create web-lb-proxy --global --url-map=web-lb-url-map --ssl-certificates=web-cert --project=acme-prod"
    );
    assert!(runs[8].contains("--target-https-proxy=web-lb-proxy --address=web-lb-ip --ports=443"));
}

#[test]
fn existing_resources_are_skipped() {
    let runner = RecordingRunner::new()
        .exists_when("health-checks describe")
        .exists_when("url-maps describe")
        .exists_when("addresses describe");
    setup_load_balancer(&runner, &mut unattended(), &settings()).expect("configured");

    let runs = runner.runs();
    assert_eq!(runs.len(), 3, "unexpected runs: {runs:#?}");
    assert!(runs[0].starts_with("gcloud compute backend-services create"));
    assert!(runs[1].starts_with("gcloud compute target-http-proxies create"));
    assert!(runs[2].starts_with("gcloud compute forwarding-rules create"));
}

#[test]
fn path_matcher_failure_is_only_a_warning() {
    let runner = RecordingRunner::new().fail_when("add-path-matcher");
    setup_load_balancer(&runner, &mut unattended(), &settings()).expect("configured");
    assert_eq!(runner.runs().len(), 7);
}

#[test]
fn create_failure_names_step_and_resource() {
    let runner = RecordingRunner::new().fail_when("backend-services create");
    let err = setup_load_balancer(&runner, &mut unattended(), &settings())
        .expect_err("backend fails");
    let message = format!("{err:#}");
    assert!(
        message.starts_with(
            "Creating Backend Services failed: failed to create backend service 'service-1-backend'"
        ),
        "unexpected error: {message}"
    );
    assert_eq!(runner.runs().len(), 2);
}

#[test]
fn missing_certificate_falls_back_to_http() {
    let runner = RecordingRunner::new();
    let mut prompter = scripted("\n\n\n\ny\n\n\n\n\n\n\ny\n");
    setup_load_balancer(&runner, &mut prompter, &settings()).expect("configured");
    let runs = runner.runs();
    assert!(runs[4].starts_with("gcloud compute target-http-proxies create gcloud-lb-proxy"));
    assert!(runs[6].contains("--ports=80"));
}

#[test]
fn declining_confirmation_runs_nothing() {
    let runner = RecordingRunner::new();
    let mut prompter = scripted(&"\n".repeat(11));
    setup_load_balancer(&runner, &mut prompter, &settings()).expect("cancel is not an error");
    assert!(runner.runs().is_empty());
    assert!(runner.probes().is_empty());
}

#[test]
fn project_id_is_required() {
    let runner = RecordingRunner::new();
    let err = setup_load_balancer(&runner, &mut unattended(), &Settings::default())
        .expect_err("no project");
    assert_eq!(err.to_string(), "GCP_PROJECT_ID is required");
    assert!(runner.runs().is_empty());
}

#[test]
fn protocols_parse_case_insensitively() {
    assert_eq!("https".parse::<Protocol>().expect("https"), Protocol::Https);
    assert_eq!("Http".parse::<Protocol>().expect("http"), Protocol::Http);
    assert!("grpc".parse::<Protocol>().is_err());
}
