pub const DEPLOY_WORKFLOW_YML: &str = include_str!("../templates/gcloud-deploy.yml");
pub const ENV_GCLOUD_TEMPLATE: &str = include_str!("../templates/env.gcloud.template");
