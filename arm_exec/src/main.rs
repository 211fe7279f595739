//! Main arm executable entry point.
//!
//! # Architecture
//!
//! Every run of the executable:
//!
//!     - Loads the executable parameters
//!     - Creates a session and initialises logging
//!     - Runs one of the subcommands:
//!         - `ik`: solves the joint angles for a target
//!         - `calibrate`: runs an interactive calibration sweep on a test jig
//!         - `compensate`: compensates a desired angle using a calibration file
//!         - `console`: reads arm commands and sends the resulting demands to
//!           the servos
//!     - Exits the session, waiting for any archived data to be written

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::path::PathBuf;
use structopt::{clap::AppSettings, StructOpt};

// Internal
use arm_lib::{
    arm_ctrl::{self, ArmCtrl},
    calib::{
        file::{CalibFormat, CalibSource},
        prompt::PromptSource,
        session::{save_rows, CalibSession},
        CalibTable, JointId,
    },
    kinematics::{self, Point2D},
    params::ArmExecParams,
    servo_client::{LogServoClient, ServoClient},
};
use comms_if::{
    eqpt::servo::{ServoDems, ServoDemsResponse},
    tc::{arm_ctrl::ArmCmd, parse_line, TcParseError},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "arm $ ";

const ARM_CTRL_PARAMS: &str = "arm_ctrl.toml";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Two link arm inverse kinematics and servo calibration.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec")]
enum Cli {
    /// Solve the joint angles placing the head of the arm at (x, y).
    #[structopt(setting = AppSettings::AllowNegativeNumbers)]
    Ik { x: f64, y: f64 },

    /// Run an interactive calibration sweep on a test jig.
    Calibrate {
        /// Identifier of the test jig, used to name the calibration file.
        jig_id: String,
    },

    /// Compensate a desired joint angle using a calibration file.
    #[structopt(setting = AppSettings::AllowNegativeNumbers)]
    Compensate {
        /// Joint to compensate, "shoulder" or "elbow".
        joint: JointId,

        /// Desired angle in degrees.
        angle_deg: f64,

        /// Calibration file to use, relative to the current directory. If not
        /// given the file in the ArmCtrl parameters is used.
        #[structopt(long, parse(from_os_str))]
        file: Option<PathBuf>,

        /// Layout of the calibration file, "csv" or "pairs".
        #[structopt(long, default_value = "csv")]
        format: CalibFormat,
    },

    /// Read arm commands and send the resulting demands to the servos.
    Console,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let cli = Cli::from_args();

    // ---- LOAD PARAMETERS ----

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;

    let log_level: LevelFilter = exec_params
        .log_level
        .parse()
        .map_err(|_| eyre!("Invalid log level {:?}", exec_params.log_level))?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", cli);

    // ---- RUN ----

    let result = match cli {
        Cli::Ik { x, y } => run_ik(x, y),
        Cli::Calibrate { jig_id } => run_calibrate(&exec_params, &jig_id, &session),
        Cli::Compensate {
            joint,
            angle_deg,
            file,
            format,
        } => run_compensate(joint, angle_deg, file, format),
        Cli::Console => run_console(&exec_params, &session),
    };

    if let Err(ref e) = result {
        error!("{:?}", e);
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    session.exit();

    result
}

/// Solve the inverse kinematics for a single target.
fn run_ik(x: f64, y: f64) -> Result<(), Report> {
    let params: arm_ctrl::Params =
        util::params::load(ARM_CTRL_PARAMS).wrap_err("Could not load ArmCtrl params")?;
    let links = params.link_lengths().wrap_err("Invalid arm geometry")?;

    let angles = kinematics::solve(&Point2D::new(x, y), &links)
        .wrap_err_with(|| format!("Cannot reach target ({}, {})", x, y))?;

    info!(
        "Target ({}, {}): alpha = {:.6} deg, beta = {:.6} deg",
        x, y, angles.alpha_deg, angles.beta_deg
    );

    Ok(())
}

/// Run an interactive calibration sweep, saving the results to the
/// calibration directory.
fn run_calibrate(exec_params: &ArmExecParams, jig_id: &str, session: &Session) -> Result<(), Report> {
    let calib_dir = host::get_arm_sw_root()
        .wrap_err("The ARM_SW_ROOT environment variable is not set")?
        .join(&exec_params.calib_dir);

    info!("Calibrating jig {:?}", jig_id);

    let source = PromptSource::new().wrap_err("Could not open the operator prompt")?;
    let mut calib_session = CalibSession::new(
        exec_params.calib_session.clone(),
        source,
        LogServoClient::new(),
    );

    let rows = calib_session.run().wrap_err("Calibration failed")?;

    // Rows are saved before being validated so no measurement is lost
    save_rows(&calib_dir, jig_id, &rows).wrap_err("Could not save the calibration data")?;
    session.save("calib/rows.json", rows.clone());

    let table = CalibTable::from_rows(&rows).wrap_err("Calibration data is not a valid table")?;

    for joint in JointId::ALL.iter() {
        for e in table.entries(*joint) {
            info!(
                "{:>8} {:6.1} deg: error {:+.3} deg",
                joint, e.desired_deg, e.error_deg
            );
        }
    }

    session.save("calib/table.json", table);

    Ok(())
}

/// Compensate a single desired angle.
fn run_compensate(
    joint: JointId,
    angle_deg: f64,
    file: Option<PathBuf>,
    format: CalibFormat,
) -> Result<(), Report> {
    // Files given on the command line are relative to the current directory
    // rather than the software root
    let file = match file {
        Some(p) if p.is_relative() => Some(
            std::env::current_dir()
                .wrap_err("Could not get the current directory")?
                .join(p),
        ),
        f => f,
    };

    let source = match file {
        Some(path) => match format {
            CalibFormat::Csv => CalibSource::Csv { path },
            CalibFormat::Pairs => match joint {
                JointId::Shoulder => CalibSource::Pairs {
                    shoulder: Some(path),
                    elbow: None,
                },
                JointId::Elbow => CalibSource::Pairs {
                    shoulder: None,
                    elbow: Some(path),
                },
            },
        },
        None => {
            let params: arm_ctrl::Params =
                util::params::load(ARM_CTRL_PARAMS).wrap_err("Could not load ArmCtrl params")?;
            params
                .calib
                .ok_or_else(|| eyre!("No calibration file given and none set in the ArmCtrl params"))?
        }
    };

    debug!("Calibration source: {:?}", source);

    let table = source.load().wrap_err("Could not load the calibration table")?;
    let comp_deg = table
        .compensate(joint, angle_deg)
        .wrap_err("Could not compensate the angle")?;

    info!(
        "{} {} deg compensated to {:.6} deg",
        joint, angle_deg, comp_deg
    );

    Ok(())
}

/// Interactive console executing arm commands.
fn run_console(exec_params: &ArmExecParams, session: &Session) -> Result<(), Report> {
    let history_path = host::get_arm_sw_root()
        .wrap_err("The ARM_SW_ROOT environment variable is not set")?
        .join(&exec_params.console_history_path);

    let mut ctrl = ArmCtrl::default();
    ctrl
        .init(
            arm_ctrl::InitData {
                params_file: ARM_CTRL_PARAMS.into(),
                calib_table: None,
            },
            session,
        )
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete");

    let mut client = LogServoClient::new();

    let mut rl = DefaultEditor::new().wrap_err("Could not open the console")?;
    if rl.load_history(&history_path).is_err() {
        info!("No history detected");
    }

    info!("Console ready, enter \"help\" for commands or \"exit\" to quit");

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!("Console error: {}", e);
                break;
            }
        };

        let _ = rl.add_history_entry(line.as_str());

        if line.trim() == "exit" {
            break;
        }

        let cmd = match parse_line::<ArmCmd>(&line) {
            Ok(c) => c,
            Err(TcParseError::Empty) => continue,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        match ctrl.proc(&arm_ctrl::InputData { cmd: Some(cmd) }) {
            Ok((dems, report)) => {
                debug!("ArmCtrl status: {:?}", report);
                send_dems(&mut client, &dems);
            }
            Err(e) => error!("Could not execute the command: {}", e),
        }
    }

    info!("Making the arm safe");
    send_dems(&mut client, &ctrl.make_safe());

    if let Err(e) = rl.save_history(&history_path) {
        warn!("Could not save the console history: {}", e);
    }

    info!("{} demands sent", client.num_sent());

    Ok(())
}

/// Send demands to the servos, logging any failure.
fn send_dems<C: ServoClient>(client: &mut C, dems: &ServoDems) {
    match client.send(dems) {
        Ok(ServoDemsResponse::DemsOk) => (),
        Ok(r) => warn!("Servo driver rejected the demands: {:?}", r),
        Err(e) => error!("Could not send the demands: {}", e),
    }
}
