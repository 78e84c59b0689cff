use std::{path::PathBuf, str::FromStr, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use lot_console::{
    client::ApiClient,
    config::{self, ConsoleConfig},
    errors::ServiceError,
    gateway::AllocationGateway,
    models::{
        AllocationRequest, AvailableItemsResponse, IntakeForm, ItemHistoryResponse, LotAssignment,
        LotSummary, MaterialType, ScanResult, TaskItemsResponse,
    },
    services::{
        allocation::{LotAllocationPlanner, QuantityMode},
        barcode::{parse_item_id, UNRECOGNIZED_CODE},
        intake::IntakeService,
        labels::{item_label_file_name, save_label_pdf, task_labels_file_name},
        scan::{LineCodeReader, ScanSession},
    },
    session::{self, Session},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize()?;

    match cli.command {
        Commands::Auth(command) => handle_auth_command(&context, command, cli.json).await?,
        Commands::Materials(command) => handle_materials_command(&context, command, cli.json).await?,
        Commands::Lots(command) => handle_lots_command(&context, command, cli.json).await?,
        Commands::Tasks(command) => handle_tasks_command(&context, command, cli.json).await?,
        Commands::Labels(command) => handle_labels_command(&context, command, cli.json).await?,
        Commands::Scan(command) => handle_scan_command(&context, command, cli.json).await?,
        Commands::Items(command) => handle_items_command(&context, command, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "lot-console",
    about = "Factory inventory console for lot intake, task allocation and label scanning",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Auth(AuthCommands),
    #[command(subcommand)]
    Materials(MaterialsCommands),
    #[command(subcommand)]
    Lots(LotsCommands),
    #[command(subcommand)]
    Tasks(TasksCommands),
    #[command(subcommand)]
    Labels(LabelsCommands),
    #[command(subcommand)]
    Scan(ScanCommands),
    #[command(subcommand)]
    Items(ItemsCommands),
}

#[derive(Subcommand)]
enum AuthCommands {
    Login(AuthLoginArgs),
    Whoami,
    Logout,
}

#[derive(Subcommand)]
enum MaterialsCommands {
    List,
}

#[derive(Subcommand)]
enum LotsCommands {
    List(ListLotsArgs),
    Add(AddLotArgs),
}

#[derive(Subcommand)]
enum TasksCommands {
    Items(TaskArgs),
    Available(AvailableArgs),
    Assign(AssignArgs),
    Remove(RemoveItemArgs),
}

#[derive(Subcommand)]
enum LabelsCommands {
    Print(PrintLabelArgs),
    PrintAll(PrintAllArgs),
}

#[derive(Subcommand)]
enum ScanCommands {
    Verify(ScanVerifyArgs),
    Parse(ScanParseArgs),
}

#[derive(Subcommand)]
enum ItemsCommands {
    History(ItemArgs),
}

#[derive(Args)]
struct AuthLoginArgs {
    #[arg(long, help = "Operator username")]
    username: String,
    #[arg(long, help = "Operator password")]
    password: String,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Do not persist the session to disk"
    )]
    no_save: bool,
}

#[derive(Args)]
struct ListLotsArgs {
    #[arg(long, help = "Only show lots of this material type")]
    material_type: Option<String>,
}

#[derive(Args)]
struct AddLotArgs {
    #[arg(long, help = "Material type identifier (e.g. MT001)")]
    material_type: String,
    #[arg(long, help = "Factory lot number printed by the supplier")]
    lot_number: String,
    #[arg(long, default_value = "", help = "Total quantity in the material's unit")]
    total: String,
    #[arg(long, default_value = "", help = "Number of cartons received")]
    cartons: String,
    #[arg(long, default_value = "", help = "Items per carton")]
    per_carton: String,
    #[arg(long, default_value = "", help = "Quantity per item in the material's unit")]
    item_quantity: String,
}

#[derive(Args)]
struct TaskArgs {
    #[arg(long, help = "Task identifier")]
    task: String,
}

#[derive(Args)]
struct AvailableArgs {
    #[arg(long, help = "Task identifier")]
    task: String,
    #[arg(long, help = "Only show stock of this material type")]
    material_type: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum QuantityModeArg {
    Items,
    Total,
}

impl From<QuantityModeArg> for QuantityMode {
    fn from(value: QuantityModeArg) -> Self {
        match value {
            QuantityModeArg::Items => QuantityMode::Items,
            QuantityModeArg::Total => QuantityMode::Total,
        }
    }
}

#[derive(Args)]
struct AssignArgs {
    #[arg(long, help = "Task identifier")]
    task: String,
    #[arg(long, help = "Material type to allocate")]
    material_type: String,
    #[arg(long, value_enum, default_value = "total", help = "Allocate whole items or a total quantity")]
    mode: QuantityModeArg,
    #[arg(long, help = "Requested total quantity (total mode)")]
    quantity: Option<String>,
    #[arg(
        long = "lot",
        value_parser = parse_lot_selection,
        help = "Lot selection: LOT=COUNT[@QTY] in items mode, LOT[=QTY] in total mode (repeatable)"
    )]
    lots: Vec<LotSelectionInput>,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Show the assignment batch without submitting it"
    )]
    dry_run: bool,
}

#[derive(Args)]
struct RemoveItemArgs {
    #[arg(long, help = "Task identifier")]
    task: String,
    #[arg(long, help = "Item to remove from the task")]
    item: String,
}

#[derive(Args)]
struct PrintLabelArgs {
    #[arg(long, help = "Task the item is assigned to")]
    task: String,
    #[arg(long, help = "Item identifier")]
    item: String,
    #[arg(long, default_value = ".", help = "Output file or directory")]
    output: PathBuf,
}

#[derive(Args)]
struct PrintAllArgs {
    #[arg(long, help = "Task identifier")]
    task: String,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Include items whose labels were already printed"
    )]
    show_printed: bool,
    #[arg(long, default_value = ".", help = "Output file or directory")]
    output: PathBuf,
}

#[derive(Args)]
struct ScanVerifyArgs {
    #[arg(long, help = "Task the scanned items should belong to")]
    task: String,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Stop after the first scanned code"
    )]
    once: bool,
}

#[derive(Args)]
struct ScanParseArgs {
    #[arg(help = "Raw scanned text")]
    text: String,
}

#[derive(Args)]
struct ItemArgs {
    #[arg(long, help = "Item identifier")]
    item: String,
}

#[derive(Clone, Debug)]
struct LotSelectionInput {
    lot_id: String,
    value: Option<String>,
    bucket: Option<Decimal>,
}

#[derive(Serialize)]
struct AuthLoginOutput<'a> {
    user_id: &'a str,
    username: &'a str,
    user_type_id: Option<&'a str>,
    saved_session_path: Option<String>,
}

#[derive(Serialize)]
struct AssignmentOutput<'a> {
    task_id: &'a str,
    submitted: bool,
    total_quantity: Decimal,
    request: &'a AllocationRequest,
    message: Option<String>,
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    raw_text: &'a str,
    item_id: Option<String>,
}

struct CliContext {
    config: ConsoleConfig,
    client: ApiClient,
    session: Option<Session>,
}

impl CliContext {
    fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load console config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let client = ApiClient::new(&config).context("failed to build API client")?;

        let session = match config.session_path() {
            Some(path) => session::load_session(&path)
                .with_context(|| format!("failed to read session file {}", path.display()))?,
            None => None,
        };

        let (client, session) = match session {
            Some(stored) if stored.belongs_to(&config.api_base_url) => {
                debug!(username = %stored.username, "Using saved session");
                (stored.authorize(client), Some(stored))
            }
            Some(stored) => {
                warn!(
                    session_url = %stored.api_base_url,
                    "Saved session belongs to a different backend; ignoring it"
                );
                (client, None)
            }
            None => (client, None),
        };

        Ok(Self {
            config,
            client,
            session,
        })
    }

    fn intake_service(&self) -> IntakeService {
        IntakeService::new(Arc::new(self.client.clone()))
    }
}

fn action_error(action: &str, err: ServiceError) -> anyhow::Error {
    anyhow!("{}: {}", action, err.user_message())
}

async fn handle_auth_command(context: &CliContext, command: AuthCommands, json: bool) -> Result<()> {
    match command {
        AuthCommands::Login(args) => handle_auth_login(context, args, json).await,
        AuthCommands::Whoami => handle_auth_whoami(context, json),
        AuthCommands::Logout => handle_auth_logout(context),
    }
}

async fn handle_auth_login(context: &CliContext, args: AuthLoginArgs, json: bool) -> Result<()> {
    let session = session::login(&context.client, &args.username, &args.password)
        .await
        .map_err(|err| action_error("登入失敗", err))?;

    let saved_path = if args.no_save {
        None
    } else if let Some(path) = context.config.session_path() {
        session::save_session(&path, &session)
            .with_context(|| format!("failed writing {}", path.display()))?;
        Some(path.display().to_string())
    } else {
        eprintln!("Skipping session persistence: no suitable directory found.");
        None
    };

    if json {
        print_json(&AuthLoginOutput {
            user_id: &session.user_id,
            username: &session.username,
            user_type_id: session.user_type_id.as_deref(),
            saved_session_path: saved_path,
        })?;
    } else {
        println!("Authenticated operator: {} ({})", session.username, session.user_id);
        if let Some(path) = saved_path {
            println!("Session saved to: {}", path);
        }
    }
    Ok(())
}

fn handle_auth_whoami(context: &CliContext, json: bool) -> Result<()> {
    let session = context
        .session
        .as_ref()
        .ok_or_else(|| anyhow!("no saved session; run `lot-console auth login` first"))?;

    if json {
        #[derive(Serialize)]
        struct WhoAmI<'a> {
            user_id: &'a str,
            username: &'a str,
            user_type_id: Option<&'a str>,
            api_base_url: &'a str,
            saved_at: String,
        }
        print_json(&WhoAmI {
            user_id: &session.user_id,
            username: &session.username,
            user_type_id: session.user_type_id.as_deref(),
            api_base_url: &session.api_base_url,
            saved_at: session.saved_at.to_rfc3339(),
        })?;
    } else {
        println!("User: {} ({})", session.username, session.user_id);
        if let Some(user_type) = session.user_type_id.as_deref() {
            println!("User type: {}", user_type);
        }
        println!("Backend: {}", session.api_base_url);
        println!("Logged in at: {}", session.saved_at.to_rfc3339());
    }
    Ok(())
}

fn handle_auth_logout(context: &CliContext) -> Result<()> {
    let Some(path) = context.config.session_path() else {
        println!("No session location configured.");
        return Ok(());
    };

    let removed = session::clear_session(&path)
        .with_context(|| format!("failed to remove {}", path.display()))?;
    if removed {
        println!("Cleared session file {}", path.display());
    } else {
        println!("No saved session.");
    }
    Ok(())
}

async fn handle_materials_command(
    context: &CliContext,
    command: MaterialsCommands,
    json: bool,
) -> Result<()> {
    match command {
        MaterialsCommands::List => {
            let materials = context
                .client
                .material_types()
                .await
                .map_err(|err| action_error("無法載入物料類型", err))?;
            if json {
                print_json(&materials)?;
            } else if materials.is_empty() {
                println!("No material types.");
            } else {
                materials.iter().for_each(render_material_type);
            }
            Ok(())
        }
    }
}

async fn handle_lots_command(context: &CliContext, command: LotsCommands, json: bool) -> Result<()> {
    match command {
        LotsCommands::List(args) => {
            let mut lots = context
                .client
                .lots()
                .await
                .map_err(|err| action_error("無法載入批次", err))?;
            if let Some(material_type) = args.material_type.as_deref() {
                lots.retain(|lot| lot.material_type_id == material_type);
            }
            if json {
                print_json(&lots)?;
            } else if lots.is_empty() {
                println!("No lots found.");
            } else {
                lots.iter().for_each(render_lot);
            }
            Ok(())
        }
        LotsCommands::Add(args) => handle_add_lot(context, args, json).await,
    }
}

async fn handle_add_lot(context: &CliContext, args: AddLotArgs, json: bool) -> Result<()> {
    let mut form = IntakeForm::new();
    form.set_material_type_id(&args.material_type);
    form.set_factory_lot_number(&args.lot_number);
    form.set_total_quantity(&args.total);
    form.set_carton_count(&args.cartons);
    form.set_items_per_carton(&args.per_carton);
    form.set_item_quantity(&args.item_quantity);

    // unit is cosmetic; a failed lookup only leaves it blank
    let unit = match context.client.material_types().await {
        Ok(materials) => materials
            .into_iter()
            .find(|mt| mt.id == form.material_type_id.trim())
            .map(|mt| mt.material_unit)
            .unwrap_or_default(),
        Err(err) => {
            debug!(error = %err, "Could not resolve material unit");
            String::new()
        }
    };

    let check = form.quantity_match(&unit);
    if !json && !check.message.is_empty() {
        println!("{}", check.message);
    }

    let response = context
        .intake_service()
        .submit(&form)
        .await
        .map_err(|err| action_error("添加失敗", err))?;

    if json {
        print_json(&response)?;
    } else {
        println!(
            "{} Lot {} • {} {} • {} cartons • {} items",
            response.message.as_deref().unwrap_or_default(),
            response.lot_id,
            form.final_quantity().normalize(),
            unit,
            response.carton_ids.len(),
            response.item_ids.len()
        );
    }
    Ok(())
}

async fn handle_tasks_command(context: &CliContext, command: TasksCommands, json: bool) -> Result<()> {
    match command {
        TasksCommands::Items(args) => {
            let items = context
                .client
                .task_items(&args.task)
                .await
                .map_err(|err| action_error("無法載入任務物品", err))?;
            if json {
                print_json(&items)?;
            } else {
                render_task_items(&items);
            }
            Ok(())
        }
        TasksCommands::Available(args) => {
            let available = context
                .client
                .available_items(&args.task, args.material_type.as_deref())
                .await
                .map_err(|err| action_error("無法載入可用物品", err))?;
            if json {
                print_json(&available)?;
            } else {
                render_availability(&available);
            }
            Ok(())
        }
        TasksCommands::Assign(args) => handle_assign(context, args, json).await,
        TasksCommands::Remove(args) => {
            let response = context
                .client
                .remove_task_item(&args.task, &args.item)
                .await
                .map_err(|err| action_error("移除失敗", err))?;
            if json {
                print_json(&response)?;
            } else {
                println!(
                    "{}",
                    response
                        .message
                        .unwrap_or_else(|| format!("Removed {} from {}", args.item, args.task))
                );
            }
            Ok(())
        }
    }
}

async fn handle_assign(context: &CliContext, args: AssignArgs, json: bool) -> Result<()> {
    let gateway: &dyn AllocationGateway = &context.client;
    let mut planner = LotAllocationPlanner::new(args.task.clone());

    planner
        .refresh(gateway)
        .await
        .map_err(|err| action_error("無法載入可用物品", err))?;
    planner
        .select_material_type(&args.material_type)
        .map_err(|err| action_error("選擇物料類型失敗", err))?;
    planner
        .refresh(gateway)
        .await
        .map_err(|err| action_error("無法載入可用物品", err))?;
    planner
        .set_mode(args.mode.into())
        .map_err(|err| action_error("切換模式失敗", err))?;

    if let Some(quantity) = args.quantity.as_deref() {
        planner
            .set_requested_quantity(quantity)
            .map_err(|err| action_error("需求數量無效", err))?;
    }

    for selection in &args.lots {
        apply_lot_selection(&mut planner, selection)
            .map_err(|err| action_error(&format!("批次 {}", selection.lot_id), err))?;
    }

    let request = planner
        .review()
        .map_err(|err| action_error("無法提交", err))?;
    let total_quantity = planner.get_total_selected_quantity();

    if args.dry_run {
        if json {
            print_json(&AssignmentOutput {
                task_id: &args.task,
                submitted: false,
                total_quantity,
                request: &request,
                message: None,
            })?;
        } else {
            render_assignment_request(&request);
            println!("Total: {} (dry run, nothing submitted)", total_quantity.normalize());
        }
        return Ok(());
    }

    let response = planner
        .submit(gateway)
        .await
        .map_err(|err| action_error("分配失敗", err))?;

    if json {
        print_json(&AssignmentOutput {
            task_id: &args.task,
            submitted: true,
            total_quantity,
            request: &request,
            message: response.message.clone(),
        })?;
    } else {
        render_assignment_request(&request);
        println!(
            "Assigned {} items ({} total) to task {}",
            response.assigned_items.len(),
            total_quantity.normalize(),
            args.task
        );
    }
    Ok(())
}

fn apply_lot_selection(
    planner: &mut LotAllocationPlanner,
    selection: &LotSelectionInput,
) -> Result<(), ServiceError> {
    let max = planner.get_lot_max_quantity(&selection.lot_id);
    if !planner.allocation().is_selected(&selection.lot_id) {
        planner.toggle_lot_selection(&selection.lot_id, max)?;
    }

    match planner.mode() {
        QuantityMode::Items => {
            if let Some(bucket) = selection.bucket {
                planner.select_lot_bucket(&selection.lot_id, bucket)?;
            }
            let count = selection.value.as_deref().unwrap_or("0");
            planner.update_lot_count(&selection.lot_id, count)?;
        }
        QuantityMode::Total => {
            if let Some(quantity) = selection.value.as_deref() {
                planner.update_lot_quantity(&selection.lot_id, quantity)?;
            }
        }
    }
    Ok(())
}

async fn handle_labels_command(
    context: &CliContext,
    command: LabelsCommands,
    json: bool,
) -> Result<()> {
    let (document, output, default_name) = match command {
        LabelsCommands::Print(args) => {
            let document = context
                .client
                .print_item_label(&args.item, &args.task)
                .await
                .map_err(|err| action_error("打印失敗", err))?;
            (document, args.output, item_label_file_name(&args.item))
        }
        LabelsCommands::PrintAll(args) => {
            let document = context
                .client
                .print_task_labels(&args.task, args.show_printed)
                .await
                .map_err(|err| action_error("打印失敗", err))?;
            (document, args.output, task_labels_file_name(&args.task))
        }
    };

    let path = save_label_pdf(&document, &output, &default_name)
        .with_context(|| format!("failed to save labels to {}", output.display()))?;

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "bytes": document.len(),
        }))?;
    } else {
        println!("Labels saved to {}", path.display());
    }
    Ok(())
}

async fn handle_scan_command(context: &CliContext, command: ScanCommands, json: bool) -> Result<()> {
    match command {
        ScanCommands::Parse(args) => {
            let item_id = parse_item_id(&args.text);
            if json {
                print_json(&ParseOutput {
                    raw_text: &args.text,
                    item_id,
                })?;
            } else {
                println!("{}", item_id.as_deref().unwrap_or(UNRECOGNIZED_CODE));
            }
            Ok(())
        }
        ScanCommands::Verify(args) => handle_scan_verify(context, args, json).await,
    }
}

async fn handle_scan_verify(context: &CliContext, args: ScanVerifyArgs, json: bool) -> Result<()> {
    let mut session = ScanSession::new(
        args.task.clone(),
        LineCodeReader::stdin(),
        Arc::new(context.client.clone()),
    );

    if !json {
        eprintln!("Scanning for task {} (Ctrl-C to stop)...", args.task);
    }

    loop {
        let outcome = tokio::select! {
            result = session.scan_once() => result,
            _ = tokio::signal::ctrl_c() => {
                debug!("Scan cancelled");
                break;
            }
        };

        match outcome.map_err(|err| action_error("掃描失敗", err))? {
            Some(result) => {
                if json {
                    println!("{}", serde_json::to_string(&result)?);
                } else {
                    render_scan_result(&result);
                }
            }
            None => break,
        }

        if args.once {
            break;
        }
        session.retry();
    }
    Ok(())
}

async fn handle_items_command(context: &CliContext, command: ItemsCommands, json: bool) -> Result<()> {
    match command {
        ItemsCommands::History(args) => {
            let history = context
                .client
                .item_history(&args.item)
                .await
                .map_err(|err| action_error("無法載入物品紀錄", err))?;
            if json {
                print_json(&history)?;
            } else {
                render_history(&history);
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_material_type(material: &MaterialType) {
    println!(
        "- {} • {} • unit {}",
        material.id, material.material_name, material.material_unit
    );
}

fn render_lot(lot: &LotSummary) {
    println!(
        "- {} • {} • {} • available {} / {} {} ({} of {} items)",
        lot.id,
        lot.factory_lot_number,
        lot.material_name.as_deref().unwrap_or(&lot.material_type_id),
        lot.available_quantity.normalize(),
        lot.total_quantity.normalize(),
        lot.unit(),
        lot.available_items,
        lot.total_items
    );
}

fn render_task_items(response: &TaskItemsResponse) {
    println!(
        "Task {}{} • {} items • {} total",
        response.task_id,
        response
            .task_name
            .as_deref()
            .map(|name| format!(" ({})", name))
            .unwrap_or_default(),
        response.total_items,
        response.total_quantity.normalize()
    );
    for item in &response.items {
        println!(
            "- {} • {} • {} {} • {} • lot {} • {}",
            item.id,
            item.material_type_name.as_deref().unwrap_or("-"),
            item.quantity.normalize(),
            item.material_unit.as_deref().unwrap_or(""),
            item.status.label(),
            item.lot_info
                .as_ref()
                .and_then(|lot| lot.factory_lot_number.as_deref())
                .unwrap_or("-"),
            if item.is_printed() { "已打印" } else { "未打印" }
        );
    }
}

fn render_availability(response: &AvailableItemsResponse) {
    if response.material_types.is_empty() {
        println!("No available stock.");
        return;
    }
    for material in &response.material_types {
        println!(
            "{} {} • {} {} available",
            material.material_type_id,
            material.material_name,
            material.total_quantity.normalize(),
            material.material_unit
        );
        for lot in &material.lots {
            println!(
                "  - {} ({}) • {} {} • {}",
                lot.lot_id,
                lot.factory_lot_number.as_deref().unwrap_or("-"),
                lot.total_quantity.normalize(),
                material.material_unit,
                lot.summary_text(&material.material_unit)
            );
        }
    }
}

fn render_assignment_request(request: &AllocationRequest) {
    for assignment in &request.assignments {
        match assignment {
            LotAssignment::Items {
                lot_id,
                count,
                quantity,
                ..
            } => println!("- {} • {} × {}", lot_id, count, quantity.normalize()),
            LotAssignment::Total {
                lot_id, quantity, ..
            } => println!("- {} • {}", lot_id, quantity.normalize()),
        }
    }
}

fn render_scan_result(result: &ScanResult) {
    let marker = if result.success { "✔" } else { "✘" };
    match result.item_id.as_deref() {
        Some(item_id) => println!("{} {} • {}", marker, item_id, result.message),
        None => println!("{} {} • {}", marker, result.raw_text.trim(), result.message),
    }
}

fn render_history(history: &ItemHistoryResponse) {
    let item = &history.item;
    println!(
        "Item {} • {} • {} • {}",
        item.id,
        item.material_type.as_deref().unwrap_or("-"),
        item.current_quantity
            .map(|q| q.normalize().to_string())
            .unwrap_or_else(|| "-".to_string()),
        item.current_status.as_deref().unwrap_or("-")
    );
    for tx in &history.blockchain_history {
        println!(
            "- {} • {} • status {} → {} • quantity {} → {}",
            tx.timestamp.as_deref().unwrap_or("-"),
            tx.transaction_type.as_deref().unwrap_or("-"),
            tx.old_status.as_deref().unwrap_or("-"),
            tx.new_status.as_deref().unwrap_or("-"),
            tx.old_quantity
                .map(|q| q.normalize().to_string())
                .unwrap_or_else(|| "-".to_string()),
            tx.new_quantity
                .map(|q| q.normalize().to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|_| format!("invalid decimal '{raw}'"))
}

/// `LOT`, `LOT=VALUE` or `LOT=COUNT@QTY`.
fn parse_lot_selection(raw: &str) -> Result<LotSelectionInput, String> {
    let (lot_id, rest) = match raw.split_once('=') {
        Some((lot_id, rest)) => (lot_id.trim(), Some(rest.trim())),
        None => (raw.trim(), None),
    };
    if lot_id.is_empty() {
        return Err(format!("invalid lot selection '{raw}', expected LOT[=VALUE]"));
    }

    let (value, bucket) = match rest {
        Some(rest) => match rest.split_once('@') {
            Some((count, quantity)) => (Some(count.trim().to_string()), Some(parse_decimal(quantity)?)),
            None => (Some(rest.to_string()), None),
        },
        None => (None, None),
    };
    if value.as_deref().is_some_and(str::is_empty) {
        return Err(format!("lot selection '{raw}' has an empty value"));
    }

    Ok(LotSelectionInput {
        lot_id: lot_id.to_string(),
        value,
        bucket,
    })
}
