use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
use aws_smithy_types::body::SdkBody;

use org_provision::aws::types::{AccountStatus, ParentKind};
use org_provision::{AwsError, DirectoryClient, OrganizationsDirectory};

const CALLER_ACCOUNT_ID: &str = "000000000000";

fn credentials() -> Credentials {
    Credentials::new("AKIDTEST", "secret", None, None, "test")
}

fn organizations_event(operation: &str, status: u16, body: &str) -> ReplayEvent {
    ReplayEvent::new(
        http::Request::builder()
            .uri("https://organizations.us-east-1.amazonaws.com/")
            .header("x-amz-target", format!("AWSOrganizationsV20161128.{operation}"))
            .body(SdkBody::empty())
            .unwrap(),
        http::Response::builder()
            .status(status)
            .header("content-type", "application/x-amz-json-1.1")
            .body(SdkBody::from(body.to_string()))
            .unwrap(),
    )
}

fn caller_identity_event(account_id: &str) -> ReplayEvent {
    let body = format!(
        r#"<GetCallerIdentityResponse xmlns="https://sts.amazonaws.com/doc/2011-06-15/">
  <GetCallerIdentityResult>
    <Arn>arn:aws:iam::{account_id}:user/operator</Arn>
    <UserId>AIDAEXAMPLE</UserId>
    <Account>{account_id}</Account>
  </GetCallerIdentityResult>
  <ResponseMetadata>
    <RequestId>c6104cbe-af31-11e0-8154-cbc7ccf896c7</RequestId>
  </ResponseMetadata>
</GetCallerIdentityResponse>"#
    );
    ReplayEvent::new(
        http::Request::builder()
            .uri("https://sts.us-east-1.amazonaws.com/")
            .body(SdkBody::empty())
            .unwrap(),
        http::Response::builder()
            .status(200)
            .header("content-type", "text/xml")
            .body(SdkBody::from(body))
            .unwrap(),
    )
}

/// Directory whose Organizations and STS calls are answered from scripted responses.
struct ReplayedDirectory {
    directory: OrganizationsDirectory,
    organizations_http: StaticReplayClient,
    sts_http: StaticReplayClient,
}

impl ReplayedDirectory {
    fn new(organizations: Vec<ReplayEvent>, sts: Vec<ReplayEvent>) -> Self {
        let organizations_http = StaticReplayClient::new(organizations);
        let sts_http = StaticReplayClient::new(sts);

        let organizations_client = aws_sdk_organizations::Client::from_conf(
            aws_sdk_organizations::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .credentials_provider(credentials())
                .http_client(organizations_http.clone())
                .build(),
        );
        let sts_client = aws_sdk_sts::Client::from_conf(
            aws_sdk_sts::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new("us-east-1"))
                .credentials_provider(credentials())
                .http_client(sts_http.clone())
                .build(),
        );

        Self {
            directory: OrganizationsDirectory::from_clients(organizations_client, sts_client),
            organizations_http,
            sts_http,
        }
    }

    fn organizations_targets(&self) -> Vec<String> {
        self.organizations_http
            .actual_requests()
            .filter_map(|request| request.headers().get("x-amz-target"))
            .map(str::to_string)
            .collect()
    }

    fn organizations_bodies(&self) -> Vec<String> {
        self.organizations_http
            .actual_requests()
            .map(|request| {
                String::from_utf8_lossy(request.body().bytes().unwrap_or_default()).into_owned()
            })
            .collect()
    }
}

fn account_json(id: &str, name: &str, status: &str) -> String {
    format!(
        r#"{{"Id":"{id}","Arn":"arn:aws:organizations::{CALLER_ACCOUNT_ID}:account/o-example/{id}","Email":"{name}@example.com","Name":"{name}","Status":"{status}"}}"#
    )
}

#[tokio::test]
async fn test_organizations_not_in_use_is_absent_not_an_error() {
    let replay = ReplayedDirectory::new(
        vec![organizations_event(
            "DescribeOrganization",
            400,
            r#"{"__type":"AWSOrganizationsNotInUseException","Message":"Your account is not a member of an organization."}"#,
        )],
        vec![],
    );

    let organization = replay.directory.get_organization().await.unwrap();

    assert!(organization.is_none());
}

#[tokio::test]
async fn test_other_describe_organization_failures_are_raised() {
    let replay = ReplayedDirectory::new(
        vec![organizations_event(
            "DescribeOrganization",
            400,
            r#"{"__type":"AccessDeniedException","Message":"You don't have permissions to access this resource."}"#,
        )],
        vec![],
    );

    let err = replay.directory.get_organization().await.unwrap_err();

    match err {
        AwsError::Service { code, message, .. } => {
            assert_eq!(code.as_deref(), Some("AccessDeniedException"));
            assert_eq!(message, "You don't have permissions to access this resource.");
        }
        other => panic!("expected a service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_describe_organization_maps_fields() {
    let replay = ReplayedDirectory::new(
        vec![organizations_event(
            "DescribeOrganization",
            200,
            r#"{"Organization":{"Id":"o-example","Arn":"arn:aws:organizations::000000000000:organization/o-example","MasterAccountId":"000000000000"}}"#,
        )],
        vec![],
    );

    let organization = replay.directory.get_organization().await.unwrap().unwrap();

    assert_eq!(organization.id, "o-example");
    assert_eq!(organization.management_account_id.as_deref(), Some(CALLER_ACCOUNT_ID));
    assert_eq!(
        replay.organizations_targets(),
        vec!["AWSOrganizationsV20161128.DescribeOrganization"]
    );
}

#[tokio::test]
async fn test_zero_roots_is_not_found() {
    let replay = ReplayedDirectory::new(
        vec![organizations_event("ListRoots", 200, r#"{"Roots":[]}"#)],
        vec![],
    );

    let err = replay.directory.get_organization_root().await.unwrap_err();

    assert!(matches!(err, AwsError::NotFound { ref resource } if resource == "organization root"));
}

#[tokio::test]
async fn test_account_without_parents_is_not_found() {
    let replay = ReplayedDirectory::new(
        vec![organizations_event("ListParents", 200, r#"{"Parents":[]}"#)],
        vec![],
    );

    let err = replay
        .directory
        .get_parent_organizational_unit("123456789012")
        .await
        .unwrap_err();

    assert!(matches!(err, AwsError::NotFound { .. }));
}

#[tokio::test]
async fn test_parent_kind_follows_parent_type() {
    let replay = ReplayedDirectory::new(
        vec![
            organizations_event(
                "ListParents",
                200,
                r#"{"Parents":[{"Id":"ou-ab12-nested01","Type":"ORGANIZATIONAL_UNIT"}]}"#,
            ),
            organizations_event(
                "ListParents",
                200,
                r#"{"Parents":[{"Id":"r-ab12","Type":"ROOT"}]}"#,
            ),
        ],
        vec![],
    );

    let nested = replay
        .directory
        .get_parent_organizational_unit("123456789012")
        .await
        .unwrap();
    let root = replay
        .directory
        .get_parent_organizational_unit("210987654321")
        .await
        .unwrap();

    assert_eq!(nested.id, "ou-ab12-nested01");
    assert_eq!(nested.kind, ParentKind::OrganizationalUnit);
    assert_eq!(root.id, "r-ab12");
    assert_eq!(root.kind, ParentKind::Root);
}

#[tokio::test]
async fn test_move_failure_keeps_service_message_verbatim() {
    let message = "We can't find the destination container (a root or OU) with the ParentId that you specified.";
    let replay = ReplayedDirectory::new(
        vec![organizations_event(
            "MoveAccount",
            400,
            &format!(r#"{{"__type":"DestinationParentNotFoundException","Message":"{message}"}}"#),
        )],
        vec![],
    );

    let err = replay
        .directory
        .move_account("123456789012", "r-ab12", "ou-ab12-missing1")
        .await
        .unwrap_err();

    match err {
        AwsError::Move {
            account_id,
            source_parent_id,
            destination_parent_id,
            message: reported,
        } => {
            assert_eq!(account_id, "123456789012");
            assert_eq!(source_parent_id, "r-ab12");
            assert_eq!(destination_parent_id, "ou-ab12-missing1");
            assert_eq!(reported, message);
        }
        other => panic!("expected a move error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_accounts_reads_every_page_and_drops_caller() {
    let first_page = format!(
        r#"{{"Accounts":[{},{}],"NextToken":"page-2"}}"#,
        account_json(CALLER_ACCOUNT_ID, "management", "ACTIVE"),
        account_json("111111111111", "production", "ACTIVE"),
    );
    let second_page = format!(
        r#"{{"Accounts":[{},{}]}}"#,
        account_json("222222222222", "staging", "ACTIVE"),
        account_json("333333333333", "retired", "SUSPENDED"),
    );
    let replay = ReplayedDirectory::new(
        vec![
            organizations_event("ListAccounts", 200, &first_page),
            organizations_event("ListAccounts", 200, &second_page),
        ],
        vec![caller_identity_event(CALLER_ACCOUNT_ID)],
    );

    let accounts = replay.directory.list_accounts().await.unwrap();

    let ids: Vec<&str> = accounts.iter().map(|account| account.id.as_str()).collect();
    assert_eq!(ids, vec!["111111111111", "222222222222"]);
    assert!(accounts.iter().all(|account| account.status == AccountStatus::Active));
    assert_eq!(replay.organizations_targets().len(), 2);
    let bodies = replay.organizations_bodies();
    assert!(!bodies[0].contains("NextToken"));
    assert!(bodies[1].contains("page-2"));
    assert_eq!(replay.sts_http.actual_requests().count(), 1);
}

#[tokio::test]
async fn test_list_organizational_units_reads_every_page() {
    let replay = ReplayedDirectory::new(
        vec![
            organizations_event(
                "ListOrganizationalUnitsForParent",
                200,
                r#"{"OrganizationalUnits":[{"Id":"ou-ab12-apps0001","Name":"Applications"}],"NextToken":"page-2"}"#,
            ),
            organizations_event(
                "ListOrganizationalUnitsForParent",
                200,
                r#"{"OrganizationalUnits":[{"Id":"ou-ab12-data0001","Name":"Data"}]}"#,
            ),
        ],
        vec![],
    );

    let units = replay
        .directory
        .list_organizational_units("r-ab12")
        .await
        .unwrap();

    let names: Vec<&str> = units.iter().map(|unit| unit.name.as_str()).collect();
    assert_eq!(names, vec!["Applications", "Data"]);
    let bodies = replay.organizations_bodies();
    assert!(bodies.iter().all(|body| body.contains("r-ab12")));
    assert!(bodies[1].contains("page-2"));
}
