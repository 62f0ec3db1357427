use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    academic_year::{fetch_session_status, SessionScope},
    api::{
        AcademicYearQuery, AnnouncementQuery, ApprovedTopicQuery, DepartmentQuery, TopicQuery,
        UserQuery, YearSessionQuery,
    },
    event_channel,
    navigation::{guard_route, nav_for, RouteDecision},
    search::{Debouncer, ListState},
    session::decode_claims,
    workflow, AcademicYearContext, ClientError, ClientEvent, NoticeLevel, ResearchHubClient,
    SessionManager,
};
use shared::{
    domain::{
        AcademicYearId, AcademicYearStatus, AnnouncementId, ApprovedTopicId,
        ApprovedTopicStatus, DepartmentId, DocumentId, DocumentType, Role, SessionStatus,
        TopicId, TopicStatus, UserId, YearSessionId,
    },
    protocol::{
        AnnouncementRequest, ApprovedTopic, CreateAcademicYearRequest, CreateYearSessionRequest,
        DepartmentRequest, ProposeTopicRequest, UpdateAcademicYearRequest, UpdateApprovedTopicRequest,
        UpdateTopicRequest, UserRequest,
    },
};
use status_gate::{
    upload_decision, ExecutionAction, ExecutionPermissions, ExecutionSubject, MemberAction,
    ReviewAction, ReviewPermissions,
};
use storage::Storage;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{broadcast, mpsc},
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, normalize_database_url, Settings};

/// Page size used when a lookup has to walk every page.
const LOOKUP_PAGE_SIZE: u32 = 100;

#[derive(Parser, Debug)]
#[command(name = "researchhub", about = "Research topic management client")]
struct Cli {
    /// Overrides `api_base_url` from the config file and environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Full profile of the signed-in account, as the backend has it.
    Profile,
    #[command(subcommand)]
    Password(PasswordCommand),
    /// Sidebar for the signed-in role with `path` highlighted.
    Nav {
        #[arg(default_value = "/")]
        path: String,
    },
    #[command(subcommand)]
    Years(YearsCommand),
    #[command(subcommand)]
    Sessions(SessionsCommand),
    #[command(subcommand)]
    Departments(DepartmentsCommand),
    #[command(subcommand)]
    Topics(TopicsCommand),
    Review {
        topic_id: i64,
        action: ReviewArg,
        #[arg(long)]
        feedback: Option<String>,
        /// Department used to look up the session when the topic does not
        /// report one.
        #[arg(long)]
        department: Option<i64>,
    },
    Member {
        topic_id: i64,
        user_id: i64,
        decision: MemberArg,
    },
    Propose(ProposeArgs),
    #[command(subcommand)]
    Approved(ApprovedCommand),
    #[command(subcommand)]
    Documents(DocumentsCommand),
    #[command(subcommand)]
    Announcements(AnnouncementsCommand),
    #[command(subcommand)]
    Users(UsersCommand),
    /// Evaluates the status gate offline.
    #[command(subcommand)]
    Gate(GateCommand),
}

#[derive(Args, Debug, Clone, Default)]
struct PageArgs {
    #[arg(long)]
    keyword: Option<String>,
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[arg(long)]
    size: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum YearsCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
    },
    Select {
        id: i64,
    },
    Create {
        year: i32,
        #[arg(long, default_value = "START")]
        status: AcademicYearStatus,
        #[arg(long)]
        inactive: bool,
    },
    Update {
        id: i64,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        status: Option<AcademicYearStatus>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
enum PasswordCommand {
    Change {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
    /// Has a new password mailed to the account's address.
    Forgot {
        username: String,
    },
}

#[derive(Subcommand, Debug)]
enum DepartmentsCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
    },
    Create {
        code: String,
        name: String,
    },
    Update {
        id: i64,
        code: String,
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
        #[arg(long)]
        department: Option<i64>,
        #[arg(long)]
        status: Option<SessionStatus>,
    },
    Create {
        academic_year_id: i64,
        department_id: i64,
        #[arg(long)]
        status: Option<SessionStatus>,
    },
    Update {
        id: i64,
        status: SessionStatus,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum TopicsCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
        #[arg(long)]
        status: Option<TopicStatus>,
        #[arg(long)]
        department: Option<i64>,
        /// Ignore the selected academic year.
        #[arg(long)]
        all_years: bool,
    },
    Show {
        id: i64,
        /// Department used to look up the session when the topic does not
        /// report one.
        #[arg(long)]
        department: Option<i64>,
    },
    /// Topics the signed-in user belongs to.
    Mine,
    /// Sends a join request for a topic whose registration is open.
    Join {
        id: i64,
        /// Department used to look up the session when the topic does not
        /// report one.
        #[arg(long)]
        department: Option<i64>,
    },
    AssignAdvisor {
        id: i64,
        user_id: i64,
    },
    AssignLeader {
        id: i64,
        user_id: i64,
    },
    /// Reads keywords from stdin and lists matches once typing pauses.
    Search {
        #[arg(long)]
        status: Option<TopicStatus>,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        objective: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        budget: Option<f64>,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Args, Debug)]
struct ProposeArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    objective: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    budget: Option<f64>,
    #[arg(long)]
    note: Option<String>,
    #[arg(long)]
    advisor: Option<i64>,
    /// Department whose registration session gates the proposal.
    #[arg(long)]
    department: i64,
}

#[derive(Subcommand, Debug)]
enum ApprovedCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
        #[arg(long)]
        status: Option<ApprovedTopicStatus>,
    },
    Show {
        id: i64,
    },
    Edit {
        id: i64,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        prize: Option<String>,
        #[arg(long)]
        field: Option<String>,
        #[arg(long = "type")]
        research_type: Option<String>,
    },
    Complete {
        id: i64,
    },
    NotCompleted {
        id: i64,
    },
    Cancel {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum DocumentsCommand {
    List {
        approved_id: i64,
    },
    ForTopic {
        topic_id: i64,
    },
    Upload {
        approved_id: i64,
        document_type: DocumentType,
        file: PathBuf,
        #[arg(long)]
        summary: Option<String>,
    },
    Summary {
        id: i64,
        summary: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum AnnouncementsCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
    },
    Create {
        title: String,
        content: String,
        #[arg(long)]
        department: Option<i64>,
    },
    Update {
        id: i64,
        title: String,
        content: String,
        #[arg(long)]
        department: Option<i64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List {
        #[command(flatten)]
        paging: PageArgs,
        #[arg(long)]
        role: Option<Role>,
    },
    Create {
        username: String,
        full_name: String,
        role: Role,
        #[arg(long)]
        department: Option<i64>,
    },
    Update {
        id: i64,
        username: String,
        full_name: String,
        role: Role,
        #[arg(long)]
        department: Option<i64>,
    },
    ResetPassword {
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum GateCommand {
    Review {
        topic: TopicStatus,
        #[arg(long)]
        session: Option<SessionStatus>,
    },
    Execution {
        status: ApprovedTopicStatus,
        #[arg(long, default_value = "")]
        code: String,
        #[arg(long)]
        session: Option<SessionStatus>,
    },
    Upload {
        status: ApprovedTopicStatus,
        document_type: DocumentType,
        #[arg(long)]
        summary: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ReviewArg {
    Approve,
    Reject,
    RequestUpdate,
}

impl From<ReviewArg> for ReviewAction {
    fn from(arg: ReviewArg) -> Self {
        match arg {
            ReviewArg::Approve => ReviewAction::Approve,
            ReviewArg::Reject => ReviewAction::Reject,
            ReviewArg::RequestUpdate => ReviewAction::RequestUpdate,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum MemberArg {
    Approve,
    Reject,
}

impl From<MemberArg> for MemberAction {
    fn from(arg: MemberArg) -> Self {
        match arg {
            MemberArg::Approve => MemberAction::Approve,
            MemberArg::Reject => MemberAction::Reject,
        }
    }
}

struct App {
    settings: Settings,
    client: Arc<ResearchHubClient>,
    storage: Storage,
    years: Arc<AcademicYearContext>,
    session: SessionManager,
    events: broadcast::Receiver<ClientEvent>,
}

impl App {
    async fn open(settings: Settings) -> Result<Self> {
        let database_url = normalize_database_url(&settings.database_url);
        let storage = Storage::new(&database_url).await?;
        let client = Arc::new(ResearchHubClient::with_timeout(
            &settings.api_base_url,
            settings.request_timeout(),
        )?);
        let (events_tx, events) = event_channel();
        let years = Arc::new(AcademicYearContext::new(
            client.clone(),
            storage.clone(),
            events_tx.clone(),
        ));
        let session = SessionManager::new(client.clone(), storage.clone(), years.clone(), events_tx);
        session.restore().await?;
        debug!(api = %settings.api_base_url, db = %database_url, "client ready");

        Ok(Self {
            settings,
            client,
            storage,
            years,
            session,
            events,
        })
    }

    fn page_size(&self, paging: &PageArgs) -> u32 {
        paging.size.unwrap_or(self.settings.page_size)
    }

    /// Selected academic year, or `None` when years cannot be loaded. A
    /// failed load has already produced an error notice.
    async fn selected_year(&self) -> Option<AcademicYearId> {
        self.years.refresh().await.ok().flatten()
    }

    /// The selected year's session for `department`, when both are known.
    async fn session_scope(&self, department: Option<i64>) -> Option<SessionScope> {
        let department_id = DepartmentId(department?);
        let academic_year_id = self.selected_year().await?;
        Some(SessionScope {
            academic_year_id,
            department_id,
        })
    }

    fn drain_notices(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                ClientEvent::Notice { level, message } => match level {
                    NoticeLevel::Error => eprintln!("error: {message}"),
                    NoticeLevel::Success | NoticeLevel::Info => eprintln!("{message}"),
                },
                other => debug!(?other, "client event"),
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", describe(&err));
            ExitCode::FAILURE
        }
    }
}

fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ClientError>() {
        Some(client_err) => client_err.user_message(),
        None => format!("{err:#}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    if let Command::Gate(gate) = cli.command {
        return run_gate(gate);
    }

    let mut app = App::open(settings).await?;
    let outcome = dispatch(&mut app, cli.command).await;
    app.drain_notices();
    outcome
}

async fn dispatch(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let session = app.session.login(&username, &password).await?;
            println!(
                "signed in as {} ({})",
                session.display_name(),
                session.role()
            );
            if let Some(year) = app.selected_year().await {
                println!("academic year {year}");
            }
        }
        Command::Logout => {
            app.session.logout().await?;
            println!("signed out");
        }
        Command::Whoami => {
            let session = app.session.require().await?;
            println!("{} ({})", session.display_name(), session.role());
            println!("home {}", session.nav().home);
        }
        Command::Nav { path } => {
            let token = app.storage.auth_token().await?;
            match guard_route(token.as_deref(), &path) {
                RouteDecision::Allow => {}
                RouteDecision::Redirect(target) => println!("{path} redirects to {target}"),
            }
            let role = match token.as_deref().map(decode_claims) {
                Some(Ok(claims)) => claims.role,
                _ => return Err(ClientError::Unauthenticated.into()),
            };
            render::navigation(nav_for(role), &path);
        }
        Command::Profile => {
            app.session.require().await?;
            let profile = app.client.me().await?;
            render::profile(&profile);
        }
        Command::Password(command) => password(app, command).await?,
        Command::Departments(command) => departments(app, command).await?,
        Command::Years(command) => years(app, command).await?,
        Command::Sessions(command) => sessions(app, command).await?,
        Command::Topics(command) => topics(app, command).await?,
        Command::Review {
            topic_id,
            action,
            feedback,
            department,
        } => {
            app.session.require().await?;
            let scope = app.session_scope(department).await;
            let updated = workflow::review_topic(
                &app.client,
                TopicId(topic_id),
                action.into(),
                feedback.as_deref(),
                scope,
            )
            .await?;
            println!("topic {} is now {}", updated.id, updated.status);
        }
        Command::Member {
            topic_id,
            user_id,
            decision,
        } => {
            app.session.require().await?;
            let updated = workflow::decide_member(
                &app.client,
                TopicId(topic_id),
                UserId(user_id),
                decision.into(),
            )
            .await?;
            println!(
                "topic {}: {} pending, {} approved",
                updated.id,
                updated.pending_members.len(),
                updated.approved_members.len()
            );
        }
        Command::Propose(args) => propose(app, args).await?,
        Command::Approved(command) => approved(app, command).await?,
        Command::Documents(command) => documents(app, command).await?,
        Command::Announcements(command) => announcements(app, command).await?,
        Command::Users(command) => users(app, command).await?,
        Command::Gate(gate) => run_gate(gate)?,
    }
    Ok(())
}

async fn password(app: &mut App, command: PasswordCommand) -> Result<()> {
    match command {
        PasswordCommand::Change { old, new } => {
            app.session.require().await?;
            if new.trim().is_empty() {
                return Err(ClientError::Validation("new password is required".to_string()).into());
            }
            app.client.change_password(&old, &new).await?;
            println!("password changed");
        }
        PasswordCommand::Forgot { username } => {
            if username.trim().is_empty() {
                return Err(ClientError::Validation("username is required".to_string()).into());
            }
            app.client.forgot_password(username.trim()).await?;
            println!("a new password has been sent to the account's email");
        }
    }
    Ok(())
}

async fn departments(app: &mut App, command: DepartmentsCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        DepartmentsCommand::List { paging } => {
            let query = DepartmentQuery {
                keyword: paging.keyword.clone(),
                page: paging.page,
                size: app.page_size(&paging),
            };
            let page = app.client.list_departments(&query).await?;
            render::departments(&page.content);
            render::page_footer(&page, paging.page);
        }
        DepartmentsCommand::Create { code, name } => {
            let created = app
                .client
                .create_department(&DepartmentRequest { code, name })
                .await?;
            render::departments(&[created]);
        }
        DepartmentsCommand::Update { id, code, name } => {
            let updated = app
                .client
                .update_department(DepartmentId(id), &DepartmentRequest { code, name })
                .await?;
            render::departments(&[updated]);
        }
    }
    Ok(())
}

async fn years(app: &mut App, command: YearsCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        YearsCommand::List { paging } => {
            let query = AcademicYearQuery {
                keyword: paging.keyword.clone(),
                page: paging.page,
                size: app.page_size(&paging),
                ..AcademicYearQuery::default()
            };
            let page = app.client.list_academic_years(&query).await?;
            let selected = app.selected_year().await;
            render::academic_years(&page.content, selected);
            render::page_footer(&page, paging.page);
        }
        YearsCommand::Select { id } => {
            app.years.refresh().await?;
            app.years.select(AcademicYearId(id)).await?;
        }
        YearsCommand::Create {
            year,
            status,
            inactive,
        } => {
            let created = app
                .client
                .create_academic_year(&CreateAcademicYearRequest {
                    year,
                    status,
                    is_active: !inactive,
                })
                .await?;
            println!("created academic year {} ({})", created.year, created.id);
        }
        YearsCommand::Update {
            id,
            year,
            status,
            active,
        } => {
            let updated = app
                .client
                .update_academic_year(
                    AcademicYearId(id),
                    &UpdateAcademicYearRequest {
                        year,
                        status,
                        is_active: active,
                    },
                )
                .await?;
            render::academic_years(&[updated], None);
        }
    }
    Ok(())
}

async fn sessions(app: &mut App, command: SessionsCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        SessionsCommand::List {
            paging,
            department,
            status,
        } => {
            let query = YearSessionQuery {
                keyword: paging.keyword.clone(),
                department_id: department.map(DepartmentId),
                status,
                page: paging.page,
                size: app.page_size(&paging),
            };
            let page = app.client.list_year_sessions(&query).await?;
            render::year_sessions(&page.content);
            render::page_footer(&page, paging.page);
        }
        SessionsCommand::Create {
            academic_year_id,
            department_id,
            status,
        } => {
            let created = app
                .client
                .create_year_session(&CreateYearSessionRequest {
                    academic_year_id: AcademicYearId(academic_year_id),
                    department_id: DepartmentId(department_id),
                    status,
                })
                .await?;
            render::year_sessions(&[created]);
        }
        SessionsCommand::Update { id, status } => {
            let updated = app
                .client
                .update_year_session(YearSessionId(id), status)
                .await?;
            render::year_sessions(&[updated]);
        }
        SessionsCommand::Delete { id } => {
            app.client.delete_year_session(YearSessionId(id)).await?;
            println!("deleted year session {id}");
        }
    }
    Ok(())
}

async fn topics(app: &mut App, command: TopicsCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        TopicsCommand::List {
            paging,
            status,
            department,
            all_years,
        } => {
            let academic_year_id = if all_years {
                None
            } else {
                app.selected_year().await
            };
            let query = TopicQuery {
                keyword: paging.keyword.clone(),
                status,
                department_id: department.map(DepartmentId),
                academic_year_id,
                page: paging.page,
                size: app.page_size(&paging),
            };
            let page = app.client.list_topics(&query).await?;
            render::topics(&page.content);
            render::page_footer(&page, paging.page);
        }
        TopicsCommand::Show { id, department } => {
            let topic = app.client.get_topic(TopicId(id)).await?;
            let scope = app.session_scope(department).await;
            let session = workflow::topic_session(&app.client, &topic, scope).await?;
            let permissions = ReviewPermissions::evaluate(topic.status, session);
            render::topic_detail(&topic, &permissions);
        }
        TopicsCommand::Mine => {
            let mine = app.client.my_topics().await?;
            render::topics(&mine);
        }
        TopicsCommand::Join { id, department } => {
            let scope = app.session_scope(department).await;
            workflow::join_topic(&app.client, TopicId(id), scope).await?;
            println!("join request sent for topic {id}");
        }
        TopicsCommand::AssignAdvisor { id, user_id } => {
            app.client
                .assign_advisor(TopicId(id), UserId(user_id))
                .await?;
            println!("user {user_id} now advises topic {id}");
        }
        TopicsCommand::AssignLeader { id, user_id } => {
            app.client
                .assign_leader(TopicId(id), UserId(user_id))
                .await?;
            println!("user {user_id} now leads topic {id}");
        }
        TopicsCommand::Search { status } => search_topics(app, status).await?,
        TopicsCommand::Edit {
            id,
            title,
            description,
            objective,
            content,
            budget,
            note,
        } => {
            app.client
                .update_topic(
                    TopicId(id),
                    &UpdateTopicRequest {
                        name: title,
                        description,
                        target: objective,
                        main_content: content,
                        budget,
                        note,
                        ..UpdateTopicRequest::default()
                    },
                )
                .await?;
            println!("updated topic {id}");
        }
    }
    Ok(())
}

/// Each stdin line replaces the keyword; a listing is fetched once input
/// has been quiet for the debounce delay. Fetches run concurrently and a
/// response to a superseded keyword is dropped.
async fn search_topics(app: &mut App, status: Option<TopicStatus>) -> Result<()> {
    let academic_year_id = app.selected_year().await;
    let debouncer = Debouncer::new(app.settings.search_debounce());
    let mut settled = debouncer.subscribe();
    let mut list = ListState::new(app.settings.page_size);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (results_tx, mut results) = mpsc::unbounded_channel();

    eprintln!("type to search, empty input clears, ctrl-d quits");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line.context("failed to read stdin")? {
                    Some(line) => debouncer.push(line).await,
                    None => break,
                }
            }
            changed = settled.changed() => {
                if changed.is_err() {
                    break;
                }
                let keyword = settled.borrow_and_update().clone();
                if !list.set_keyword(keyword) {
                    continue;
                }
                let ticket = list.begin_request();
                let query = TopicQuery {
                    keyword: list.query().keyword_filter(),
                    status,
                    academic_year_id,
                    page: list.query().page,
                    size: list.query().size,
                    ..TopicQuery::default()
                };
                let client = app.client.clone();
                let results_tx = results_tx.clone();
                tokio::spawn(async move {
                    let outcome = client.list_topics(&query).await;
                    let _ = results_tx.send((ticket, outcome));
                });
            }
            Some((ticket, outcome)) = results.recv() => {
                match outcome {
                    Ok(page) => {
                        if list.accept(ticket, page) {
                            render::topics(list.items());
                        }
                    }
                    Err(err) if list.is_current(ticket) => {
                        warn!(error = %err, "topic search failed");
                        eprintln!("error: {}", err.user_message());
                    }
                    Err(err) => debug!(error = %err, "ignoring failure of a superseded search"),
                }
            }
        }
    }
    Ok(())
}

async fn propose(app: &mut App, args: ProposeArgs) -> Result<()> {
    app.session.require().await?;
    let academic_year_id = app.selected_year().await;
    let session = match academic_year_id {
        Some(academic_year_id) => {
            let scope = SessionScope {
                academic_year_id,
                department_id: DepartmentId(args.department),
            };
            fetch_session_status(&app.client, scope).await?
        }
        None => None,
    };

    let proposal = ProposeTopicRequest {
        title: args.title,
        description: args.description,
        objective: args.objective,
        content: args.content,
        budget: args.budget,
        note: args.note,
        advisor_id: args.advisor.map(UserId),
        academic_year_id,
    };
    workflow::propose_topic(&app.client, &proposal, session).await?;
    println!("submitted \"{}\"", proposal.title);
    Ok(())
}

/// There is no single-item endpoint for approved topics, so walk the list.
async fn find_approved(client: &ResearchHubClient, id: ApprovedTopicId) -> Result<ApprovedTopic> {
    let mut page = 0;
    loop {
        let batch = client
            .list_approved_topics(&ApprovedTopicQuery {
                page,
                size: LOOKUP_PAGE_SIZE,
                ..ApprovedTopicQuery::default()
            })
            .await?;
        if let Some(found) = batch.content.into_iter().find(|topic| topic.id == id) {
            return Ok(found);
        }
        page += 1;
        if page >= batch.total_pages {
            anyhow::bail!("approved topic {id} not found");
        }
    }
}

async fn approved(app: &mut App, command: ApprovedCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        ApprovedCommand::List { paging, status } => {
            let query = ApprovedTopicQuery {
                keyword: paging.keyword.clone(),
                status,
                academic_year_id: app.selected_year().await,
                page: paging.page,
                size: app.page_size(&paging),
                ..ApprovedTopicQuery::default()
            };
            let page = app.client.list_approved_topics(&query).await?;
            render::approved_topics(&page.content);
            render::page_footer(&page, paging.page);
        }
        ApprovedCommand::Show { id } => {
            let topic = find_approved(&app.client, ApprovedTopicId(id)).await?;
            let permissions = ExecutionPermissions::evaluate(
                &ExecutionSubject::from(&topic),
                topic.topic.session_status,
            );
            render::approved_detail(&topic, &permissions);
            let documents = app.client.list_documents(topic.id).await?;
            render::documents(&documents);
        }
        ApprovedCommand::Edit {
            id,
            code,
            prize,
            field,
            research_type,
        } => {
            let topic = find_approved(&app.client, ApprovedTopicId(id)).await?;
            let mut request = UpdateApprovedTopicRequest::with_status(&topic, topic.status);
            if let Some(code) = code {
                request.code = code.trim().to_string();
            }
            request.prize = prize.or(request.prize);
            request.field_research = field.or(request.field_research);
            request.type_research = research_type.or(request.type_research);
            let updated = app.client.update_approved_topic(topic.id, &request).await?;
            render::approved_topics(&[updated]);
        }
        ApprovedCommand::Complete { id } => {
            transition(app, ApprovedTopicId(id), ExecutionAction::Complete).await?
        }
        ApprovedCommand::NotCompleted { id } => {
            transition(app, ApprovedTopicId(id), ExecutionAction::MarkNotCompleted).await?
        }
        ApprovedCommand::Cancel { id } => {
            transition(app, ApprovedTopicId(id), ExecutionAction::Cancel).await?
        }
    }
    Ok(())
}

async fn transition(app: &App, id: ApprovedTopicId, action: ExecutionAction) -> Result<()> {
    let topic = find_approved(&app.client, id).await?;
    let session = topic.topic.session_status;
    let updated = match action {
        ExecutionAction::Complete => workflow::complete_topic(&app.client, &topic, session).await?,
        ExecutionAction::MarkNotCompleted => {
            workflow::mark_not_completed(&app.client, &topic, session).await?
        }
        ExecutionAction::Cancel => workflow::cancel_topic(&app.client, &topic, session).await?,
    };
    info!(approved_topic_id = %updated.id, status = %updated.status, "transition applied");
    render::approved_topics(&[updated]);
    Ok(())
}

async fn documents(app: &mut App, command: DocumentsCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        DocumentsCommand::List { approved_id } => {
            let documents = app.client.list_documents(ApprovedTopicId(approved_id)).await?;
            render::documents(&documents);
        }
        DocumentsCommand::ForTopic { topic_id } => {
            let documents = app.client.list_documents_for_topic(TopicId(topic_id)).await?;
            render::documents(&documents);
        }
        DocumentsCommand::Upload {
            approved_id,
            document_type,
            file,
            summary,
        } => {
            let topic = find_approved(&app.client, ApprovedTopicId(approved_id)).await?;
            upload_decision(topic.status, document_type, summary.as_deref()).into_result()?;
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            let document = workflow::upload_document(
                &app.client,
                &topic,
                document_type,
                &filename,
                bytes,
                summary.as_deref(),
            )
            .await?;
            render::documents(&[document]);
        }
        DocumentsCommand::Summary { id, summary } => {
            let document =
                workflow::update_document_summary(&app.client, DocumentId(id), &summary).await?;
            render::documents(&[document]);
        }
        DocumentsCommand::Delete { id } => {
            app.client.delete_document(DocumentId(id)).await?;
            println!("deleted document {id}");
        }
    }
    Ok(())
}

async fn announcements(app: &mut App, command: AnnouncementsCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        AnnouncementsCommand::List { paging } => {
            let query = AnnouncementQuery {
                keyword: paging.keyword.clone(),
                academic_year_id: app.selected_year().await,
                page: paging.page,
                size: app.page_size(&paging),
                ..AnnouncementQuery::default()
            };
            let page = app.client.list_announcements(&query).await?;
            render::announcements(&page.content);
            render::page_footer(&page, paging.page);
        }
        AnnouncementsCommand::Create {
            title,
            content,
            department,
        } => {
            let created = app
                .client
                .create_announcement(&AnnouncementRequest {
                    title,
                    content,
                    department_id: department.map(DepartmentId),
                    academic_year_id: app.selected_year().await,
                })
                .await?;
            render::announcements(&[created]);
        }
        AnnouncementsCommand::Update {
            id,
            title,
            content,
            department,
        } => {
            let updated = app
                .client
                .update_announcement(
                    AnnouncementId(id),
                    &AnnouncementRequest {
                        title,
                        content,
                        department_id: department.map(DepartmentId),
                        academic_year_id: app.selected_year().await,
                    },
                )
                .await?;
            render::announcements(&[updated]);
        }
        AnnouncementsCommand::Delete { id } => {
            app.client.delete_announcement(AnnouncementId(id)).await?;
            println!("deleted announcement {id}");
        }
    }
    Ok(())
}

async fn users(app: &mut App, command: UsersCommand) -> Result<()> {
    app.session.require().await?;
    match command {
        UsersCommand::List { paging, role } => {
            let query = UserQuery {
                keyword: paging.keyword.clone(),
                role,
                page: paging.page,
                size: app.page_size(&paging),
                ..UserQuery::default()
            };
            let page = app.client.list_users(&query).await?;
            render::users(&page.content);
            render::page_footer(&page, paging.page);
        }
        UsersCommand::Create {
            username,
            full_name,
            role,
            department,
        } => {
            let created = app
                .client
                .create_user(&UserRequest {
                    username,
                    full_name,
                    role,
                    department_id: department.map(DepartmentId),
                })
                .await?;
            render::users(&[created]);
        }
        UsersCommand::Update {
            id,
            username,
            full_name,
            role,
            department,
        } => {
            let updated = app
                .client
                .update_user(
                    UserId(id),
                    &UserRequest {
                        username,
                        full_name,
                        role,
                        department_id: department.map(DepartmentId),
                    },
                )
                .await?;
            render::users(&[updated]);
        }
        UsersCommand::ResetPassword { id } => {
            app.client.reset_password(UserId(id)).await?;
            println!("password reset for user {id}");
        }
    }
    Ok(())
}

fn run_gate(command: GateCommand) -> Result<()> {
    let json = match command {
        GateCommand::Review { topic, session } => {
            serde_json::to_string_pretty(&ReviewPermissions::evaluate(topic, session))?
        }
        GateCommand::Execution {
            status,
            code,
            session,
        } => serde_json::to_string_pretty(&ExecutionPermissions::evaluate(
            &ExecutionSubject::new(status, &code),
            session,
        ))?,
        GateCommand::Upload {
            status,
            document_type,
            summary,
        } => serde_json::to_string_pretty(&upload_decision(
            status,
            document_type,
            summary.as_deref(),
        ))?,
    };
    println!("{json}");
    Ok(())
}
